//! Exclusive ownership of a working directory for the length of a run.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub const LOCK_FILENAME: &str = ".initrd-prep.lock";

/// RAII guard: unlocks and removes the lock file on drop.
#[derive(Debug)]
pub struct WorkDirLock {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl WorkDirLock {
    /// Take the lock, failing immediately if another run holds it.
    pub fn acquire(work_dir: &Path) -> Result<Self> {
        let path = work_dir.join(LOCK_FILENAME);

        // Never unlink a lock file someone else may hold; a second process
        // could then lock a fresh file at the same path.
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("creating lock file '{}'", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            drop(file);
            return Err(anyhow::anyhow!(
                "work directory is in use by another initrd-prep run: {}",
                path.display()
            ));
        }

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_held() {
        let temp = TempDir::new().unwrap();
        let lock = WorkDirLock::acquire(temp.path()).unwrap();
        assert!(lock.path().is_file());

        let err = WorkDirLock::acquire(temp.path()).unwrap_err();
        assert!(err.to_string().contains("in use"));

        drop(lock);
        assert!(!temp.path().join(LOCK_FILENAME).exists());
        assert!(WorkDirLock::acquire(temp.path()).is_ok());
    }
}
