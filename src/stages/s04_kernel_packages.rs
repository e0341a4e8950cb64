use anyhow::Result;

use super::apply_resolved;
use crate::arch::X86_32;
use crate::build::context::BuildContext;
use crate::config::Config;
use crate::manifest::AppliedPackage;
use crate::packages::resolve::PackageResolver;
use crate::process::Runner;

/// Kernel packages wanted for `arch`: the configured set, plus the PAE
/// kernels on 32-bit x86.
pub fn kernel_package_names(config: &Config, arch: &str) -> Vec<String> {
    let mut names = config.packages.kernel.clone();
    if arch == X86_32 {
        names.extend(config.packages.pae.iter().cloned());
    }
    names
}

/// Apply every kernel package into `<work>/kernels`, resolved for the
/// kernel architecture (`i686` on an `i386` target).
pub fn apply_kernel_packages(
    ctx: &BuildContext,
    config: &Config,
    resolver: &PackageResolver<'_>,
    runner: &dyn Runner,
) -> Result<Vec<AppliedPackage>> {
    let names = kernel_package_names(config, &ctx.arch);
    let kernels = ctx.kernels_dir();
    apply_resolved(resolver, runner, &names, ctx.kernel_arch(), |_| {
        kernels.clone()
    })
}
