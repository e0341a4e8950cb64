//! Build context shared by every pipeline stage.
//!
//! All paths are absolute and fixed when the context is created. Stages read
//! them from here instead of changing the process working directory.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::arch::kernel_arch;
use crate::config::Config;
use crate::packages::distro::DistributionTree;

/// Output names written into the working directory.
pub const INITRD_BOOT: &str = "initrd-boot.img";
pub const INITRD_XEN: &str = "initrd-xen.img";
pub const BOOT_IMG: &str = "boot.img";
pub const INITRD_IMG: &str = "initrd.img";
pub const KERNELS_DIR: &str = "kernels";
pub const MOUNT_DIR: &str = "mnt";

pub struct BuildContext {
    /// Directory every working subdirectory and output lands in.
    pub work_dir: PathBuf,
    /// Root of the locally built package tree.
    pub local_tree: PathBuf,
    /// Root of the generated distribution tree.
    pub distro_root: PathBuf,
    /// Target architecture.
    pub arch: String,
}

impl BuildContext {
    /// Create a context for `arch` rooted at `work_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `work_dir` cannot be created or resolved.
    pub fn new(work_dir: &Path, config: &Config, arch: &str) -> Result<Self> {
        if arch.trim().is_empty() {
            bail!("target architecture must not be empty");
        }
        fs::create_dir_all(work_dir)
            .with_context(|| format!("creating work directory '{}'", work_dir.display()))?;
        let work_dir = fs::canonicalize(work_dir)
            .with_context(|| format!("resolving work directory '{}'", work_dir.display()))?;

        let local_tree = work_dir.join(&config.packages.local_tree);
        let distro_root = work_dir.join(DistributionTree::relative_path(&config.distro.name, arch));

        Ok(Self {
            work_dir,
            local_tree,
            distro_root,
            arch: arch.to_string(),
        })
    }

    /// Create a context without touching the filesystem.
    pub fn for_testing(work_dir: &Path, local_tree: &Path, arch: &str) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            local_tree: local_tree.to_path_buf(),
            distro_root: work_dir.join("rocks-dist").join(arch),
            arch: arch.to_string(),
        }
    }

    /// Architecture kernel packages are selected for.
    pub fn kernel_arch(&self) -> &str {
        kernel_arch(&self.arch)
    }

    /// Working directory a base package is applied into.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.work_dir.join(package)
    }

    pub fn kernels_dir(&self) -> PathBuf {
        self.work_dir.join(KERNELS_DIR)
    }

    pub fn mount_point(&self) -> PathBuf {
        self.work_dir.join(MOUNT_DIR)
    }

    /// Path of a file inside the distribution tree.
    pub fn distro_file(&self, rel: &str) -> PathBuf {
        self.distro_root.join(rel)
    }

    /// Path of an output file in the working directory.
    pub fn output(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }
}
