//! Scoped loop mounts.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::process::{Cmd, Runner};

/// A loop-mounted image; unmounted exactly once, on [`LoopMount::unmount`]
/// or on drop, whichever comes first.
pub struct LoopMount<'r> {
    runner: &'r dyn Runner,
    mount_point: PathBuf,
    mounted: bool,
}

impl<'r> LoopMount<'r> {
    pub fn mount(runner: &'r dyn Runner, image: &Path, mount_point: &Path) -> Result<Self> {
        Cmd::new("mount")
            .args(["-o", "loop"])
            .arg_path(image)
            .arg_path(mount_point)
            .error_msg(format!(
                "loop-mounting '{}' on '{}'",
                image.display(),
                mount_point.display()
            ))
            .run_with(runner)?;

        Ok(Self {
            runner,
            mount_point: mount_point.to_path_buf(),
            mounted: true,
        })
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Unmount now and report failure to the caller.
    pub fn unmount(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        // Cleared first: a failed umount is reported once, not retried on drop.
        self.mounted = false;
        Cmd::new("umount")
            .arg_path(&self.mount_point)
            .error_msg(format!("unmounting '{}'", self.mount_point.display()))
            .run_with(self.runner)?;
        Ok(())
    }
}

impl Drop for LoopMount<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            eprintln!("  [WARN] {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;

    #[test]
    fn explicit_unmount_runs_once() {
        let runner = RecordingRunner::new();
        let mount =
            LoopMount::mount(&runner, Path::new("/w/boot.img"), Path::new("/w/mnt")).unwrap();
        assert_eq!(mount.mount_point(), Path::new("/w/mnt"));
        mount.unmount().unwrap();

        assert_eq!(
            runner.lines(),
            vec!["mount -o loop /w/boot.img /w/mnt", "umount /w/mnt"]
        );
    }

    #[test]
    fn drop_unmounts() {
        let runner = RecordingRunner::new();
        {
            let _mount =
                LoopMount::mount(&runner, Path::new("/w/boot.img"), Path::new("/w/mnt")).unwrap();
        }
        assert_eq!(runner.tools(), vec!["mount", "umount"]);
    }

    #[test]
    fn failed_mount_leaves_nothing_to_unmount() {
        let runner = RecordingRunner::new().fail_tool("mount", 32);
        let result = LoopMount::mount(&runner, Path::new("/w/boot.img"), Path::new("/w/mnt"));
        assert!(result.is_err());
        assert_eq!(runner.tools(), vec!["mount"]);
    }

    #[test]
    fn failed_unmount_is_reported_not_retried() {
        let runner = RecordingRunner::new().fail_tool("umount", 32);
        let mount =
            LoopMount::mount(&runner, Path::new("/w/boot.img"), Path::new("/w/mnt")).unwrap();
        assert!(mount.unmount().is_err());
        assert_eq!(runner.tools(), vec!["mount", "umount"]);
    }
}
