//! Index over a locally built package tree.
//!
//! The tree is scanned once per run. Version-control metadata directories
//! are pruned together with everything below them, so a package file that
//! lives under `.../CVS/...` is never visible to lookup.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{PackageDescriptor, PackageKey, PackageSource};

/// Directory names that hold version-control metadata.
pub const VCS_METADATA_DIRS: &[&str] = &["CVS", ".svn", ".git", ".hg"];

/// Exact-match (name, architecture) index over a local package tree.
#[derive(Debug, Clone, Default)]
pub struct LocalPackageIndex {
    root: PathBuf,
    packages: Vec<PackageDescriptor>,
    by_key: HashMap<PackageKey, usize>,
}

impl LocalPackageIndex {
    /// Scan `root` recursively.
    ///
    /// Files whose key cannot be derived are ignored. A missing root, or one
    /// that itself lies under a VCS metadata directory, gives an empty index:
    /// every lookup then falls through to the distribution.
    pub fn build(root: &Path) -> Self {
        let mut index = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        if !root.is_dir() {
            eprintln!(
                "  [WARN] local package tree '{}' not found; packages resolve from the distribution only",
                root.display()
            );
            return index;
        }

        if let Some(vcs) = vcs_component(root) {
            eprintln!(
                "  [WARN] local package tree '{}' lies inside '{}' metadata; ignoring it",
                root.display(),
                vcs
            );
            return index;
        }

        for package in scan_packages(root, PackageSource::Local) {
            index.insert(package);
        }
        index
    }

    /// First package found for (name, arch) during the scan, if any.
    ///
    /// Several files may share a key on disk; only the first one found is
    /// ever surfaced. No version comparison takes place.
    pub fn lookup(&self, name: &str, arch: &str) -> Option<&PackageDescriptor> {
        let key = PackageKey::new(name, arch);
        self.by_key.get(&key).map(|&idx| &self.packages[idx])
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every package file found, duplicates included, in scan order.
    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn insert(&mut self, package: PackageDescriptor) {
        let idx = self.packages.len();
        self.by_key.entry(package.key.clone()).or_insert(idx);
        self.packages.push(package);
    }
}

/// Walk `root` and collect every derivable package file.
///
/// Entries are visited in file-name order so "first found" is stable across
/// runs and filesystems. Unreadable entries are skipped.
pub fn scan_packages(root: &Path, source: PackageSource) -> Vec<PackageDescriptor> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_vcs_metadata(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| PackageDescriptor::from_path(entry.path(), source))
        .collect()
}

/// First component of `path` that names a VCS metadata directory.
fn vcs_component(path: &Path) -> Option<&str> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .find(|name| VCS_METADATA_DIRS.contains(name))
}

fn is_vcs_metadata(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| VCS_METADATA_DIRS.contains(&name))
}
