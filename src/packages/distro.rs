//! The generated distribution tree.
//!
//! The tree itself is produced by an external generator command; this module
//! runs that command, checks the tree appeared, and answers best-match
//! package queries against it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::index::scan_packages;
use super::resolve::RemoteResolver;
use super::{PackageDescriptor, PackageSource};
use crate::arch::{precedence_list, rank};
use crate::error::BuildError;
use crate::process::{Cmd, Runner};

/// A distribution tree rooted at `<work_dir>/<name>/<arch>`.
#[derive(Debug, Clone)]
pub struct DistributionTree {
    root: PathBuf,
    packages: Vec<PackageDescriptor>,
}

impl DistributionTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            packages: Vec::new(),
        }
    }

    /// Relative location of a tree inside the working directory.
    pub fn relative_path(name: &str, arch: &str) -> PathBuf {
        Path::new(name).join(arch)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run the generator in `work_dir`, then load the tree's package list.
    pub fn generate(
        &mut self,
        runner: &dyn Runner,
        command: &[String],
        work_dir: &Path,
        prodpath: &str,
    ) -> Result<()> {
        let (program, args) = command
            .split_first()
            .context("distribution generator command is empty")?;

        Cmd::new(program)
            .args(args)
            .current_dir(work_dir)
            .error_msg(format!(
                "distribution generator '{}' failed",
                command.join(" ")
            ))
            .run_with(runner)?;

        if !self.root.is_dir() {
            return Err(BuildError::missing(
                &self.root,
                "distribution generator finished without producing the tree",
            )
            .into());
        }

        self.load_packages(prodpath);
        Ok(())
    }

    /// Scan `<root>/<prodpath>/RPMS` for packages.
    pub fn load_packages(&mut self, prodpath: &str) {
        let rpms = self.packages_dir(prodpath);
        self.packages = scan_packages(&rpms, PackageSource::Distribution);
    }

    pub fn packages_dir(&self, prodpath: &str) -> PathBuf {
        self.root.join(prodpath).join("RPMS")
    }

    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.packages
    }

    /// Every package in the tree carrying `name`, any architecture.
    pub fn packages_named(&self, name: &str) -> Vec<&PackageDescriptor> {
        self.packages.iter().filter(|p| p.name() == name).collect()
    }
}

impl RemoteResolver for DistributionTree {
    /// Best-ranked architecture compatible with `arch`, then highest
    /// version-release among those.
    fn best_match(&self, name: &str, arch: &str) -> Option<PackageDescriptor> {
        let precedence = precedence_list(arch);
        self.packages_named(name)
            .into_iter()
            .filter_map(|pkg| rank(&precedence, pkg.arch()).map(|r| (r, pkg)))
            .min_by(|(rank_a, a), (rank_b, b)| rank_a.cmp(rank_b).then_with(|| b.compare_evr(a)))
            .map(|(_, pkg)| pkg.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    fn tree_with(files: &[&str]) -> (TempDir, DistributionTree) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("rocks-dist/i386");
        for file in files {
            let path = root.join("RedHat/RPMS").join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }
        let mut tree = DistributionTree::new(root);
        tree.load_packages("RedHat");
        (temp, tree)
    }

    #[test]
    fn best_match_prefers_native_arch() {
        let (_temp, tree) = tree_with(&[
            "kernel-2.6.18-194.el5.i386.rpm",
            "kernel-2.6.18-194.el5.i686.rpm",
        ]);
        let pkg = tree.best_match("kernel", "i686").unwrap();
        assert_eq!(pkg.arch(), "i686");
        assert_eq!(pkg.source, PackageSource::Distribution);
    }

    #[test]
    fn best_match_falls_back_through_family_and_noarch() {
        let (_temp, tree) = tree_with(&[
            "lighttpd-1.4.20-1.i586.rpm",
            "rocks-tracker-5.4-0.noarch.rpm",
        ]);
        assert_eq!(tree.best_match("lighttpd", "i386").unwrap().arch(), "i586");
        assert_eq!(
            tree.best_match("rocks-tracker", "i386").unwrap().arch(),
            "noarch"
        );
        assert!(tree.best_match("lighttpd", "x86_64").is_none());
    }

    #[test]
    fn best_match_takes_newest_within_arch() {
        let (_temp, tree) = tree_with(&[
            "kernel-2.6.18-164.el5.x86_64.rpm",
            "kernel-2.6.18-194.el5.x86_64.rpm",
            "kernel-2.6.9-1.x86_64.rpm",
        ]);
        let pkg = tree.best_match("kernel", "x86_64").unwrap();
        assert_eq!(pkg.release, "194.el5");
    }

    #[test]
    fn packages_named_lists_all_arches() {
        let (_temp, tree) = tree_with(&[
            "kernel-2.6.18-1.i386.rpm",
            "kernel-2.6.18-1.i686.rpm",
            "kernel-devel-2.6.18-1.i686.rpm",
        ]);
        assert_eq!(tree.packages_named("kernel").len(), 2);
    }

    #[test]
    fn generate_runs_command_in_work_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("rocks-dist/x86_64");
        let created = root.clone();
        let runner = RecordingRunner::new().on_each(move |_| {
            fs::create_dir_all(created.join("RedHat/RPMS")).unwrap();
            fs::write(
                created.join("RedHat/RPMS/lighttpd-1.4.20-1.x86_64.rpm"),
                b"",
            )
            .unwrap();
        });

        let mut tree = DistributionTree::new(&root);
        let command = vec!["rocks".to_string(), "create".into(), "distro".into()];
        tree.generate(&runner, &command, temp.path(), "RedHat")
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to_string(), "rocks create distro");
        assert_eq!(calls[0].working_dir(), Some(temp.path()));
        assert_eq!(tree.packages().len(), 1);
    }

    #[test]
    fn generate_without_tree_is_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let mut tree = DistributionTree::new(temp.path().join("rocks-dist/x86_64"));
        let err = tree
            .generate(&runner, &["rocks".to_string()], temp.path(), "RedHat")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingExpectedArtifact { .. })
        ));
    }

    #[test]
    fn generate_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_tool("rocks", 1);
        let mut tree = DistributionTree::new(temp.path().join("rocks-dist/x86_64"));
        let err = tree
            .generate(&runner, &["rocks".to_string()], temp.path(), "RedHat")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ExternalToolFailure { .. })
        ));
    }
}
