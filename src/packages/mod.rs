//! Binary packages: identity, lookup and extraction.
//!
//! - [`index`] - exact-match index over a locally built package tree
//! - [`distro`] - the generated distribution tree and its best-match lookup
//! - [`resolve`] - local-first resolution across both
//! - [`apply`] - extracting a resolved package into a working directory
//!
//! A package is identified by its [`PackageKey`] (name, architecture) only.
//! Version and release are carried for reporting and for ranking inside the
//! distribution tree, never for deciding whether two packages are the same.

pub mod apply;
pub mod distro;
pub mod index;
pub mod resolve;

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

pub const PACKAGE_SUFFIX: &str = ".rpm";

/// (name, architecture) identity of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageKey {
    pub name: String,
    pub arch: String,
}

impl PackageKey {
    pub fn new(name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arch: arch.into(),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.arch)
    }
}

/// Where a resolved package came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageSource {
    /// The developer's local build tree.
    Local,
    /// The generated distribution tree.
    Distribution,
}

impl fmt::Display for PackageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Distribution => f.write_str("distribution"),
        }
    }
}

/// A package file on disk together with its parsed identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    pub key: PackageKey,
    pub version: String,
    pub release: String,
    pub path: PathBuf,
    pub source: PackageSource,
}

impl PackageDescriptor {
    /// Derive a descriptor from a `name-version-release.arch.rpm` file name.
    ///
    /// Returns `None` for anything that does not have that shape; such files
    /// are simply not packages as far as lookup is concerned.
    pub fn from_path(path: &Path, source: PackageSource) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let stem = file_name.strip_suffix(PACKAGE_SUFFIX)?;
        let (nvr, arch) = stem.rsplit_once('.')?;
        let (name_version, release) = nvr.rsplit_once('-')?;
        let (name, version) = name_version.rsplit_once('-')?;

        if [name, version, release, arch].iter().any(|part| part.is_empty()) {
            return None;
        }

        Some(Self {
            key: PackageKey::new(name, arch),
            version: version.to_string(),
            release: release.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn arch(&self) -> &str {
        &self.key.arch
    }

    /// Same package iff name and architecture match exactly.
    pub fn same_package(&self, other: &Self) -> bool {
        self.key == other.key
    }

    /// Order by version, then release.
    pub fn compare_evr(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
            .then_with(|| compare_versions(&self.release, &other.release))
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}.{}",
            self.key.name, self.version, self.release, self.key.arch
        )
    }
}

/// Segment-wise version comparison.
///
/// Versions are split into runs of digits and runs of letters; anything else
/// only separates segments. Numeric runs compare by value and beat
/// alphabetic runs; when all shared segments are equal the version with more
/// segments is newer.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = version_segments(a);
    let right = version_segments(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let l_numeric = l.starts_with(|c: char| c.is_ascii_digit());
        let r_numeric = r.starts_with(|c: char| c.is_ascii_digit());
        let ordering = match (l_numeric, r_numeric) {
            (true, true) => compare_numeric(l, r),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => l.cmp(r),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left.len().cmp(&right.len())
}

fn version_segments(version: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start: Option<usize> = None;
    let mut numeric = false;

    for (idx, c) in version.char_indices() {
        let class = if c.is_ascii_digit() {
            Some(true)
        } else if c.is_ascii_alphabetic() {
            Some(false)
        } else {
            None
        };

        match (start, class) {
            (Some(s), Some(is_digit)) if is_digit != numeric => {
                segments.push(&version[s..idx]);
                start = Some(idx);
                numeric = is_digit;
            }
            (Some(s), None) => {
                segments.push(&version[s..idx]);
                start = None;
            }
            (None, Some(is_digit)) => {
                start = Some(idx);
                numeric = is_digit;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        segments.push(&version[s..]);
    }
    segments
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(file: &str) -> Option<PackageDescriptor> {
        PackageDescriptor::from_path(Path::new(file), PackageSource::Local)
    }

    #[test]
    fn derives_key_from_file_name() {
        let pkg = local("/rpms/x86_64/kernel-xen-devel-2.6.18-194.el5.x86_64.rpm").unwrap();
        assert_eq!(pkg.key, PackageKey::new("kernel-xen-devel", "x86_64"));
        assert_eq!(pkg.version, "2.6.18");
        assert_eq!(pkg.release, "194.el5");
        assert_eq!(pkg.to_string(), "kernel-xen-devel-2.6.18-194.el5.x86_64");
    }

    #[test]
    fn underivable_names_yield_none() {
        assert!(local("README").is_none());
        assert!(local("lighttpd-1.4.rpm").is_none());
        assert!(local("lighttpd.x86_64.rpm").is_none());
        assert!(local("-1.0-1.x86_64.rpm").is_none());
        assert!(local("lighttpd-1.4.20-1.x86_64.rpm.bak").is_none());
        assert!(local("rocks-tracker-1.0-.noarch.rpm").is_none());
    }

    #[test]
    fn same_package_ignores_version() {
        let a = local("lighttpd-1.4.20-1.i386.rpm").unwrap();
        let b = local("lighttpd-1.4.32-3.i386.rpm").unwrap();
        let c = local("lighttpd-1.4.20-1.i686.rpm").unwrap();
        assert!(a.same_package(&b));
        assert!(!a.same_package(&c));
    }

    #[test]
    fn version_ordering() {
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.6.18", "2.6.18"), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.01", "1.1"), Ordering::Equal);
        assert_eq!(compare_versions("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.a"), Ordering::Greater);
        assert_eq!(compare_versions("194.el5", "164.el5"), Ordering::Greater);
    }

    #[test]
    fn evr_falls_back_to_release() {
        let old = local("kernel-2.6.18-164.el5.x86_64.rpm").unwrap();
        let new = local("kernel-2.6.18-194.el5.x86_64.rpm").unwrap();
        assert_eq!(new.compare_evr(&old), Ordering::Greater);
    }
}
