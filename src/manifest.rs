//! Run report and the JSON manifest written after a successful build.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::packages::PackageDescriptor;

pub const MANIFEST_FILENAME: &str = "initrd-prep-manifest.json";

/// A package and the directory it was applied into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedPackage {
    pub package: PackageDescriptor,
    pub destination: PathBuf,
}

impl AppliedPackage {
    pub fn new(package: PackageDescriptor, destination: PathBuf) -> Self {
        Self {
            package,
            destination,
        }
    }
}

/// What one pipeline run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub arch: String,
    pub kernel_arch: String,
    pub distro_root: PathBuf,
    pub base_packages: Vec<AppliedPackage>,
    pub kernel_packages: Vec<AppliedPackage>,
    pub images: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildManifest {
    pub arch: String,
    pub kernel_arch: String,
    pub version: String,
    pub finished_at_utc: String,
    pub distro_root: PathBuf,
    pub base_packages: Vec<AppliedPackage>,
    pub kernel_packages: Vec<AppliedPackage>,
    pub images: Vec<ArtifactRecord>,
}

impl BuildManifest {
    /// Checksum every produced image and stamp the current time.
    pub fn from_report(report: &BuildReport, version: &str) -> Result<Self> {
        let images = report
            .images
            .iter()
            .map(|path| {
                let (sha256, size_bytes) = sha256_file(path)?;
                Ok(ArtifactRecord {
                    path: path.clone(),
                    sha256,
                    size_bytes,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            arch: report.arch.clone(),
            kernel_arch: report.kernel_arch.clone(),
            version: version.to_string(),
            finished_at_utc: utc_timestamp(OffsetDateTime::now_utc()),
            distro_root: report.distro_root.clone(),
            base_packages: report.base_packages.clone(),
            kernel_packages: report.kernel_packages.clone(),
            images,
        })
    }

    /// Write as pretty JSON to `<work_dir>/initrd-prep-manifest.json`.
    pub fn write(&self, work_dir: &Path) -> Result<PathBuf> {
        let path = work_dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self).context("serializing build manifest")?;
        fs::write(&path, json + "\n")
            .with_context(|| format!("writing build manifest '{}'", path.display()))?;
        Ok(path)
    }
}

fn utc_timestamp(now: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn sha256_file(path: &Path) -> Result<(String, u64)> {
    let f = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::PackageSource;
    use tempfile::TempDir;

    #[test]
    fn manifest_records_images_and_packages() {
        let temp = TempDir::new().unwrap();
        let image = temp.path().join("initrd-boot.img");
        fs::write(&image, b"hello").unwrap();

        let package = PackageDescriptor::from_path(
            Path::new("/rpms/lighttpd-1.4.20-1.x86_64.rpm"),
            PackageSource::Local,
        )
        .unwrap();
        let report = BuildReport {
            arch: "x86_64".into(),
            kernel_arch: "x86_64".into(),
            distro_root: temp.path().join("rocks-dist/x86_64"),
            base_packages: vec![AppliedPackage::new(package, temp.path().join("lighttpd"))],
            kernel_packages: Vec::new(),
            images: vec![image.clone()],
        };

        let manifest = BuildManifest::from_report(&report, "6.1.1").unwrap();
        assert_eq!(manifest.images.len(), 1);
        assert_eq!(manifest.images[0].size_bytes, 5);
        assert_eq!(
            manifest.images[0].sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );

        let path = manifest.write(temp.path()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["base_packages"][0]["package"]["source"], "local");
        assert_eq!(value["base_packages"][0]["package"]["key"]["name"], "lighttpd");
        assert_eq!(value["version"], "6.1.1");
    }

    #[test]
    fn missing_image_fails() {
        let report = BuildReport {
            images: vec![PathBuf::from("/nonexistent/initrd-boot.img")],
            ..BuildReport::default()
        };
        assert!(BuildManifest::from_report(&report, "6.1.1").is_err());
    }

    #[test]
    fn timestamp_format() {
        let ts = utc_timestamp(OffsetDateTime::UNIX_EPOCH);
        assert_eq!(ts, "1970-01-01T00:00:00Z");
    }
}
