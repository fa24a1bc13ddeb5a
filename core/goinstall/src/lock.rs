//! Per-directory install locks.
//!
//! Two installs into the same directory must not interleave: one could delete
//! files the other is unpacking. Each install holds an exclusive advisory lock
//! on a sibling file (`<parent>/.<name>.lock`) for its whole duration. The
//! lock file lives outside the installation directory so that clearing the
//! directory never removes it.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::errors::InstallError;

/// An exclusive lock on an installation directory, released on drop.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Returns the lock file path guarding `dir`.
    #[must_use]
    pub fn lock_path(dir: &Path) -> PathBuf {
        let name = dir
            .file_name()
            .map_or_else(|| "install".into(), |n| n.to_string_lossy());
        let parent = dir.parent().unwrap_or(dir);
        parent.join(format!(".{name}.lock"))
    }

    /// Acquires the lock for `dir`, waiting for any other holder.
    ///
    /// Blocking happens on a worker thread so the runtime is not stalled.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Io`] if the lock file cannot be created or
    /// locked.
    pub async fn acquire(dir: &Path) -> Result<Self, InstallError> {
        let path = Self::lock_path(dir);
        tokio::task::spawn_blocking(move || Self::acquire_blocking(path))
            .await
            .map_err(|e| InstallError::io("install lock task failed", std::io::Error::other(e)))?
    }

    fn acquire_blocking(path: PathBuf) -> Result<Self, InstallError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InstallError::io(format!("failed to create {}", parent.display()), e)
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| InstallError::io(format!("failed to open lock {}", path.display()), e))?;
        file.lock_exclusive()
            .map_err(|e| InstallError::io(format!("failed to lock {}", path.display()), e))?;
        tracing::debug!(lock = %path.display(), "acquired install lock");
        Ok(Self { file, path })
    }

    /// Returns the path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        tracing::debug!(lock = %self.path.display(), "released install lock");
    }
}
