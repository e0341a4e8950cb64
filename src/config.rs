//! Build configuration.
//!
//! Read from `initrd-prep.toml` in the working directory when present; every
//! field has a default so an empty or missing file describes the stock
//! cluster installer build.
//!
//! ```toml
//! [project]
//! name = "rocks"
//! version_major = "6"
//! version_minor = "1"
//! version_micro = "1"
//!
//! [packages]
//! local_tree = "../../../../../../RPMS"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "initrd-prep.toml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub project: ProjectConfig,
    pub distro: DistroConfig,
    pub buildinstall: BuildInstallConfig,
    pub packages: PackagesConfig,
}

/// Product identity handed to the install tree builder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProjectConfig {
    pub name: String,
    pub version_major: String,
    pub version_minor: String,
    pub version_micro: String,
    /// Release label passed to the builder.
    pub release: String,
    /// Product path segment inside the distribution tree.
    pub prodpath: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "rocks".to_string(),
            version_major: "6".to_string(),
            version_minor: "1".to_string(),
            version_micro: "1".to_string(),
            release: "0".to_string(),
            prodpath: "RedHat".to_string(),
        }
    }
}

impl ProjectConfig {
    /// `major.minor.micro`
    pub fn version(&self) -> String {
        format!(
            "{}.{}.{}",
            self.version_major, self.version_minor, self.version_micro
        )
    }

    /// Product name with its first letter upper-cased.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DistroConfig {
    /// Tree directory name; the tree lives at `<name>/<arch>`.
    pub name: String,
    /// Generator command, program first.
    pub generate: Vec<String>,
}

impl Default for DistroConfig {
    fn default() -> Self {
        Self {
            name: "rocks-dist".to_string(),
            generate: ["/opt/rocks/bin/rocks", "create", "distro", "md5=no"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Where the install tree builder comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BuildInstallConfig {
    /// Base package that ships the builder.
    pub package: String,
    /// Builder path inside that package's working directory.
    pub tool: String,
}

impl Default for BuildInstallConfig {
    fn default() -> Self {
        Self {
            package: "anaconda-runtime".to_string(),
            tool: "usr/lib/anaconda-runtime/buildinstall".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PackagesConfig {
    /// Local build tree, relative to the working directory unless absolute.
    pub local_tree: String,
    /// Applied before the install tree is built, each into its own directory.
    pub base: Vec<String>,
    /// Applied into `kernels/` after the images are extracted.
    pub kernel: Vec<String>,
    /// Extra kernels for the 32-bit x86 target.
    pub pae: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            local_tree: "../../../../../../RPMS".to_string(),
            base: strings(&["anaconda-runtime", "lighttpd", "rocks-tracker"]),
            kernel: strings(&["kernel", "kernel-devel", "kernel-xen", "kernel-xen-devel"]),
            pae: strings(&["kernel-PAE", "kernel-PAE-devel"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load `initrd-prep.toml` from `work_dir`, or defaults if absent.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let path = work_dir.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config '{}'", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            bail!("project.name must not be empty");
        }
        for (field, value) in [
            ("project.version_major", &self.project.version_major),
            ("project.version_minor", &self.project.version_minor),
            ("project.version_micro", &self.project.version_micro),
        ] {
            if value.trim().is_empty() || value.contains('.') {
                bail!("{field} must be a single non-empty version component, got '{value}'");
            }
        }
        if self.distro.generate.is_empty() {
            bail!("distro.generate must name a command");
        }
        if self.distro.name.trim().is_empty() {
            bail!("distro.name must not be empty");
        }
        if !self.packages.base.contains(&self.buildinstall.package) {
            bail!(
                "packages.base must include '{}', which provides the install tree builder",
                self.buildinstall.package
            );
        }
        if self.packages.kernel.is_empty() {
            bail!("packages.kernel must not be empty");
        }
        Ok(())
    }
}
