//! Pipeline stages, in execution order.
//!
//! Each stage is a plain function over the [`BuildContext`]; the order and
//! the forward-only cursor live in [`crate::pipeline`].
//!
//! [`BuildContext`]: crate::build::context::BuildContext

pub mod s00_distro;
pub mod s01_base_packages;
pub mod s02_install_tree;
pub mod s03_boot_images;
pub mod s04_kernel_packages;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::manifest::AppliedPackage;
use crate::packages::apply::{apply_package, ApplyFlags};
use crate::packages::resolve::PackageResolver;
use crate::process::Runner;

/// Resolve each of `names` for `arch` and apply it to `dest_for(name)`.
///
/// Stops at the first package that cannot be resolved or applied. A name
/// listed twice is applied once.
pub(crate) fn apply_resolved(
    resolver: &PackageResolver<'_>,
    runner: &dyn Runner,
    names: &[String],
    arch: &str,
    dest_for: impl Fn(&str) -> PathBuf,
) -> Result<Vec<AppliedPackage>> {
    let mut applied = Vec::with_capacity(names.len());
    for name in names {
        let package = resolver
            .resolve(name, arch)
            .with_context(|| format!("resolving '{}' for {}", name, arch))?;
        let dest = dest_for(name);
        if applied
            .iter()
            .any(|a: &AppliedPackage| a.destination == dest && a.package.same_package(&package))
        {
            println!("  {} already applied to {}; skipping", package, dest.display());
            continue;
        }
        apply_package(runner, &package, &dest, ApplyFlags::extract_only())?;
        println!(
            "  {} <- {} ({})",
            dest.display(),
            package,
            package.source
        );
        applied.push(AppliedPackage::new(package, dest));
    }
    Ok(applied)
}
