//! CPU architecture compatibility.
//!
//! The legacy x86-32 family members can stand in for one another; every
//! other architecture only matches itself. `noarch` packages fit anywhere
//! and are always tried last.

use anyhow::{bail, Result};

use crate::process::{Cmd, HostRunner, Runner};

pub const NOARCH: &str = "noarch";

/// Legacy x86-32 family in canonical (most capable first) order.
pub const LEGACY_X86_FAMILY: [&str; 4] = ["i686", "i586", "i486", "i386"];

/// 32-bit x86 target; gets the PAE kernels.
pub const X86_32: &str = "i386";

/// Itanium target; its ramdisk lives inside a boot image.
pub const ITANIUM: &str = "ia64";

/// Architecture kernel packages are built for on a 32-bit x86 target.
pub const X86_32_KERNEL_ARCH: &str = "i686";

pub fn is_legacy_x86(arch: &str) -> bool {
    LEGACY_X86_FAMILY.contains(&arch)
}

/// Ordered list of architectures whose packages run on `native`.
///
/// `native` is always first and `noarch` always last; no entry repeats.
pub fn precedence_list(native: &str) -> Vec<String> {
    let mut list = vec![native.to_string()];
    if is_legacy_x86(native) {
        list.extend(
            LEGACY_X86_FAMILY
                .iter()
                .filter(|arch| **arch != native)
                .map(|arch| arch.to_string()),
        );
    }
    if native != NOARCH {
        list.push(NOARCH.to_string());
    }
    list
}

/// Position of `arch` in `precedence`; lower is preferred.
pub fn rank(precedence: &[String], arch: &str) -> Option<usize> {
    precedence.iter().position(|candidate| candidate == arch)
}

/// Architecture used to select kernel packages for `target`.
pub fn kernel_arch(target: &str) -> &str {
    if target == X86_32 {
        X86_32_KERNEL_ARCH
    } else {
        target
    }
}

/// Machine architecture of the build host, as reported by `uname -m`.
pub fn host_arch() -> Result<String> {
    host_arch_with(&HostRunner)
}

pub fn host_arch_with(runner: &dyn Runner) -> Result<String> {
    let result = Cmd::new("uname")
        .arg("-m")
        .error_msg("querying host architecture")
        .run_with(runner)?;
    machine_from_output(&result.stdout)
}

fn machine_from_output(stdout: &str) -> Result<String> {
    let machine = stdout.trim();
    if machine.is_empty() {
        bail!("uname reported an empty machine architecture");
    }
    Ok(machine.to_string())
}
