//! Installation records.
//!
//! After a fresh install the source URL of the archive is written to a
//! `.installedFrom` marker inside the installation directory. The next
//! install attempt compares that URL with the selected variant's URL; when
//! they are equal the directory is considered up to date. Identity is by URL
//! alone, never by content.

use std::io::ErrorKind;
use std::path::Path;

use crate::errors::InstallError;

/// Name of the marker file holding the source URL.
pub const INSTALLED_FROM_FILE: &str = ".installedFrom";

/// Reads and writes the source URL of an installed toolchain.
pub trait RecordStore: Send + Sync {
    /// Returns the URL the toolchain in `dir` was installed from, if known.
    ///
    /// # Errors
    ///
    /// Returns an error if a record exists but cannot be read.
    fn installed_from(&self, dir: &Path) -> Result<Option<String>, InstallError>;

    /// Records that the toolchain in `dir` was installed from `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn record(&self, dir: &Path, url: &str) -> Result<(), InstallError>;

    /// Returns whether `dir` already holds the toolchain from `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn is_up_to_date(&self, dir: &Path, url: &str) -> Result<bool, InstallError> {
        Ok(self.installed_from(dir)?.as_deref() == Some(url))
    }
}

/// Stores the record as a UTF-8 marker file in the installation directory.
///
/// A marker that is not valid UTF-8 is read lossily and so never matches a
/// URL, which forces a reinstall.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerFileStore;

impl RecordStore for MarkerFileStore {
    fn installed_from(&self, dir: &Path) -> Result<Option<String>, InstallError> {
        let marker = dir.join(INSTALLED_FROM_FILE);
        match std::fs::read(&marker) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InstallError::io(
                format!("failed to read {}", marker.display()),
                e,
            )),
        }
    }

    fn record(&self, dir: &Path, url: &str) -> Result<(), InstallError> {
        let marker = dir.join(INSTALLED_FROM_FILE);
        std::fs::write(&marker, url)
            .map_err(|e| InstallError::io(format!("failed to write {}", marker.display()), e))
    }
}
