//! Boot image extraction.
//!
//! Itanium ships its ramdisk inside a FAT boot image that has to be loop
//! mounted; every other architecture has plain ramdisk files in the tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::arch::ITANIUM;
use crate::build::context::{BuildContext, BOOT_IMG, INITRD_BOOT, INITRD_IMG, INITRD_XEN};
use crate::build::mount::LoopMount;
use crate::error::BuildError;
use crate::process::{Cmd, Runner};

/// Ramdisk locations inside the distribution tree.
pub const ISOLINUX_INITRD: &str = "isolinux/initrd.img";
pub const XEN_INITRD: &str = "images/xen/initrd.img";
pub const ITANIUM_BOOT_IMG: &str = "images/boot.img";

/// Copy the boot artifacts for the context's architecture into the working
/// directory. Returns the files produced.
pub fn extract_boot_images(ctx: &BuildContext, runner: &dyn Runner) -> Result<Vec<PathBuf>> {
    if ctx.arch == ITANIUM {
        extract_itanium_initrd(ctx, runner)
    } else {
        copy_ramdisks(ctx, runner)
    }
}

/// copy boot.img, mount it, copy initrd.img out, unmount.
fn extract_itanium_initrd(ctx: &BuildContext, runner: &dyn Runner) -> Result<Vec<PathBuf>> {
    let source = ctx.distro_file(ITANIUM_BOOT_IMG);
    if !source.is_file() {
        return Err(BuildError::missing(&source, "did buildinstall complete?").into());
    }
    let boot_img = ctx.output(BOOT_IMG);
    let initrd = ctx.output(INITRD_IMG);

    copy_file(runner, &source, &boot_img)?;

    let mount_point = ctx.mount_point();
    fs::create_dir_all(&mount_point)
        .with_context(|| format!("creating mount point '{}'", mount_point.display()))?;

    let mount = LoopMount::mount(runner, &boot_img, &mount_point)?;
    let copied = copy_file(runner, &mount.mount_point().join(INITRD_IMG), &initrd);
    let unmounted = mount.unmount();
    copied.context("copying initrd out of the Itanium boot image")?;
    unmounted?;

    Ok(vec![boot_img, initrd])
}

/// Standard ramdisk is required; the xen one may legitimately be absent.
fn copy_ramdisks(ctx: &BuildContext, runner: &dyn Runner) -> Result<Vec<PathBuf>> {
    let standard = ctx.distro_file(ISOLINUX_INITRD);
    if !standard.is_file() {
        return Err(BuildError::missing(
            &standard,
            "could not find initrd; did buildinstall complete?",
        )
        .into());
    }
    let initrd_boot = ctx.output(INITRD_BOOT);
    copy_file(runner, &standard, &initrd_boot)
        .context("could not copy initrd; did buildinstall complete?")?;

    let mut produced = vec![initrd_boot];

    let xen = ctx.distro_file(XEN_INITRD);
    let initrd_xen = ctx.output(INITRD_XEN);
    if !xen.is_file() {
        println!("  no xen initrd at {}; skipping", xen.display());
        return Ok(produced);
    }
    match copy_file(runner, &xen, &initrd_xen) {
        Ok(()) => produced.push(initrd_xen),
        Err(e) => eprintln!("  [WARN] xen initrd not copied: {:#}", e),
    }
    Ok(produced)
}

fn copy_file(runner: &dyn Runner, source: &Path, dest: &Path) -> Result<()> {
    Cmd::new("cp")
        .arg("-f")
        .arg_path(source)
        .arg_path(dest)
        .error_msg(format!(
            "copying '{}' to '{}'",
            source.display(),
            dest.display()
        ))
        .run_with(runner)?;
    Ok(())
}
