//! Typed failure kinds surfaced by the assembly pipeline.
//!
//! Functions in this crate return `anyhow::Result` and wrap these kinds with
//! context, so callers that need to branch on the kind use
//! `err.downcast_ref::<BuildError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Neither the local tree nor the distribution provides the package.
    #[error("could not find {name} package for architecture {arch}")]
    PackageNotFound { name: String, arch: String },

    /// An external tool ran but exited unsuccessfully.
    #[error("{tool} failed ({}){}", describe_status(.status), describe_stderr(.stderr))]
    ExternalToolFailure {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    /// A stage finished but the file the next stage needs is not there.
    #[error("missing expected artifact '{}': {hint}", .path.display())]
    MissingExpectedArtifact { path: PathBuf, hint: String },
}

impl BuildError {
    pub fn missing(path: impl Into<PathBuf>, hint: impl Into<String>) -> Self {
        Self::MissingExpectedArtifact {
            path: path.into(),
            hint: hint.into(),
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_not_found_names_the_pair() {
        let err = BuildError::PackageNotFound {
            name: "lighttpd".into(),
            arch: "x86_64".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not find lighttpd package for architecture x86_64"
        );
    }

    #[test]
    fn tool_failure_formats_status_and_stderr() {
        let err = BuildError::ExternalToolFailure {
            tool: "umount".into(),
            status: Some(32),
            stderr: "target is busy".into(),
        };
        assert_eq!(err.to_string(), "umount failed (exit status 32): target is busy");

        let err = BuildError::ExternalToolFailure {
            tool: "cp".into(),
            status: None,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "cp failed (terminated by signal)");
    }

    #[test]
    fn downcast_through_context() {
        let err = anyhow::Error::new(BuildError::missing("/w/initrd-boot.img", "no initrd"))
            .context("stage images failed");
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingExpectedArtifact { .. })
        ));
    }
}
