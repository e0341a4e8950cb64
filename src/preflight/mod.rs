//! Host tool checks run before a build.
//!
//! ```rust
//! use initrd_prep::preflight::{check_required_tools, command_exists};
//!
//! if !command_exists("rpm") {
//!     println!("rpm not installed");
//! }
//!
//! let tools = &[("rpm", "rpm"), ("cp", "coreutils")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

use crate::arch::ITANIUM;

/// Check if a command is on `PATH`.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Tools every architecture needs. Each tuple is (command, package).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("rpm", "rpm"), ("cp", "coreutils")];

/// Extra tools for pulling the ramdisk out of the Itanium boot image.
pub const LOOP_MOUNT_TOOLS: &[(&str, &str)] = &[("mount", "util-linux"), ("umount", "util-linux")];

/// Tools needed to build for `arch`.
pub fn tools_for(arch: &str) -> Vec<(&'static str, &'static str)> {
    let mut tools = REQUIRED_TOOLS.to_vec();
    if arch == ITANIUM {
        tools.extend_from_slice(LOOP_MOUNT_TOOLS);
    }
    tools
}

/// Check that specific tools are available.
///
/// Every missing tool is listed with the package that provides it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

pub fn check_host_tools(arch: &str) -> Result<()> {
    check_required_tools(&tools_for(arch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        assert!(command_exists("ls"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn itanium_needs_mount_tools() {
        let names: Vec<&str> = tools_for("ia64").iter().map(|(t, _)| *t).collect();
        assert_eq!(names, vec!["rpm", "cp", "mount", "umount"]);
        assert_eq!(tools_for("x86_64").len(), 2);
    }

    #[test]
    fn test_check_required_tools_success() {
        let tools = &[("ls", "coreutils"), ("cat", "coreutils")];
        assert!(check_required_tools(tools).is_ok());
    }

    #[test]
    fn missing_tools_are_named_with_package() {
        let tools = &[("ls", "coreutils"), ("nonexistent_command_xyz", "fake-package")];
        let err = check_required_tools(tools).unwrap_err().to_string();
        assert!(err.contains("nonexistent_command_xyz (install: fake-package)"));
        assert!(!err.contains("ls (install"));
    }
}
