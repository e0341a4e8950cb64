use anyhow::Result;

use super::apply_resolved;
use crate::build::context::BuildContext;
use crate::manifest::AppliedPackage;
use crate::packages::resolve::PackageResolver;
use crate::process::Runner;

/// Apply each base package into its own `<work>/<name>` directory.
///
/// Resolved for the target architecture itself.
pub fn apply_base_packages(
    ctx: &BuildContext,
    packages: &[String],
    resolver: &PackageResolver<'_>,
    runner: &dyn Runner,
) -> Result<Vec<AppliedPackage>> {
    apply_resolved(resolver, runner, packages, &ctx.arch, |name| {
        ctx.package_dir(name)
    })
}
