//! Extracting a resolved package into a working directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::PackageDescriptor;
use crate::process::{Cmd, Runner};

/// Private rpm database kept inside each destination so the host database
/// is never touched.
pub const APPLY_DBPATH: &str = ".rpmdb";

/// What `rpm` may do besides laying down files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyFlags {
    pub no_scripts: bool,
    pub exclude_docs: bool,
}

impl ApplyFlags {
    /// Files only: no install scripts, no documentation.
    pub const fn extract_only() -> Self {
        Self {
            no_scripts: true,
            exclude_docs: true,
        }
    }
}

/// Install `package` relocated under `dest`.
pub fn apply_package(
    runner: &dyn Runner,
    package: &PackageDescriptor,
    dest: &Path,
    flags: ApplyFlags,
) -> Result<()> {
    let dbpath = dest.join(APPLY_DBPATH);
    fs::create_dir_all(&dbpath)
        .with_context(|| format!("creating package database '{}'", dbpath.display()))?;

    let mut cmd = Cmd::new("rpm")
        .args(["-i", "--force", "--nodeps", "--ignorearch", "--badreloc"])
        .arg("--relocate")
        .arg(format!("/={}", dest.display()))
        .arg("--dbpath")
        .arg_path(&dbpath);
    if flags.no_scripts {
        cmd = cmd.arg("--noscripts");
    }
    if flags.exclude_docs {
        cmd = cmd.arg("--excludedocs");
    }

    cmd.arg_path(&package.path)
        .error_msg(format!(
            "applying {} ({}) into '{}'",
            package,
            package.source,
            dest.display()
        ))
        .run_with(runner)?;
    Ok(())
}
