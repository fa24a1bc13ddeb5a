//! Install coordination.
//!
//! [`GoInstaller`] installs one configured release into the directory of a
//! named installation:
//!
//! 1. Compute the installation directory.
//! 2. Look the release up in the catalog. An unknown release id (or a missing
//!    catalog) is reported to the log sink and ends the attempt without error.
//! 3. Describe the machine and select the matching variant.
//! 4. Compare the recorded source URL with the variant's URL. Equal URLs mean
//!    the directory is up to date and nothing else happens; not even the
//!    install lock is taken. Otherwise take the directory's install lock and
//!    compare again.
//! 5. Otherwise hand the URL to the [`Transfer`]. If it reports a fresh
//!    install, drop its `.timestamp`, flatten a single wrapping directory
//!    (`go/`) and record the URL.
//!
//! Freshness is decided by URL identity only; the installed files are never
//! inspected.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::catalog::{Release, ReleaseCatalog, Variant};
use crate::errors::InstallError;
use crate::installation::Installation;
use crate::lock::InstallLock;
use crate::paths::ToolPaths;
use crate::platform::MachineProbe;
use crate::record::{MarkerFileStore, RecordStore};
use crate::selector::select_variant;
use crate::sink::LogSink;
use crate::transfer::{TIMESTAMP_FILE, Transfer};

/// Result of an install attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The directory already held the selected variant.
    AlreadyUpToDate,
    /// The variant was downloaded and unpacked.
    Installed,
    /// The transfer found its source unchanged and did nothing.
    Unchanged,
    /// The release id is not in the catalog; nothing was installed.
    UnknownRelease,
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AlreadyUpToDate => "already up to date",
            Self::Installed => "installed",
            Self::Unchanged => "unchanged",
            Self::UnknownRelease => "unknown release",
        };
        write!(f, "{text}")
    }
}

/// What an install attempt did, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// The installation directory. Always set, even for an unknown release.
    pub path: PathBuf,
    /// What happened.
    pub outcome: InstallOutcome,
    /// Source URL of the selected variant, if one was selected.
    pub url: Option<String>,
}

/// Installs a configured Go release.
#[derive(Debug)]
pub struct GoInstaller<T, S = MarkerFileStore> {
    release_id: String,
    transfer: T,
    records: S,
}

impl<T: Transfer> GoInstaller<T> {
    /// Creates an installer recording installs in `.installedFrom` markers.
    #[must_use]
    pub fn new(release_id: impl Into<String>, transfer: T) -> Self {
        Self::with_record_store(release_id, transfer, MarkerFileStore)
    }
}

impl<T: Transfer, S: RecordStore> GoInstaller<T, S> {
    /// Creates an installer with a custom record store.
    #[must_use]
    pub fn with_record_store(release_id: impl Into<String>, transfer: T, records: S) -> Self {
        Self {
            release_id: release_id.into(),
            transfer,
            records,
        }
    }

    /// Returns the release id this installer installs.
    #[must_use]
    pub fn release_id(&self) -> &str {
        &self.release_id
    }

    /// Looks up the configured release in `catalog`.
    #[must_use]
    pub fn configured_release<'a>(&self, catalog: Option<&'a ReleaseCatalog>) -> Option<&'a Release> {
        catalog?.find_release(&self.release_id)
    }

    /// Installs the configured release for `installation` on `machine`.
    ///
    /// # Errors
    ///
    /// Returns an error if the machine is unsupported, the release has no
    /// suitable variant, or the transfer or any filesystem step fails. An
    /// unknown release id is not an error; see
    /// [`InstallOutcome::UnknownRelease`].
    pub async fn install(
        &self,
        installation: &Installation,
        paths: &ToolPaths,
        catalog: Option<&ReleaseCatalog>,
        machine: &dyn MachineProbe,
        sink: &dyn LogSink,
    ) -> Result<InstallReport, InstallError> {
        let path = paths.preferred_location(&installation.name, installation.home.as_deref());

        let Some(release) = self.configured_release(catalog) else {
            sink.line(&format!("No installer found for release id {}", self.release_id));
            tracing::warn!(
                release = %self.release_id,
                installation = %installation.name,
                "no installer found for release id"
            );
            return Ok(InstallReport {
                path,
                outcome: InstallOutcome::UnknownRelease,
                url: None,
            });
        };

        let node = machine.display_name();
        let descriptor = machine.describe()?;
        let variant = select_variant(
            release,
            &descriptor.os_name,
            &descriptor.arch,
            descriptor.os_version.as_deref(),
        )?;

        let outcome = self.ensure_installed(variant, &path, &node, sink).await?;
        Ok(InstallReport {
            path,
            outcome,
            url: Some(variant.url.clone()),
        })
    }

    /// Makes sure `dir` holds `variant`, installing it if needed.
    ///
    /// `node` names the machine in the progress message.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::TransferFailed`] if the transfer fails and
    /// [`InstallError::Io`] if the record or directory cannot be updated.
    pub async fn ensure_installed(
        &self,
        variant: &Variant,
        dir: &Path,
        node: &str,
        sink: &dyn LogSink,
    ) -> Result<InstallOutcome, InstallError> {
        if self.records.is_up_to_date(dir, &variant.url)? {
            tracing::debug!(url = %variant.url, dir = %dir.display(), "installation up to date");
            return Ok(InstallOutcome::AlreadyUpToDate);
        }

        let _lock = InstallLock::acquire(dir).await?;
        // Another holder may have finished the same install while we waited.
        if self.records.is_up_to_date(dir, &variant.url)? {
            tracing::debug!(url = %variant.url, dir = %dir.display(), "installed while waiting for lock");
            return Ok(InstallOutcome::AlreadyUpToDate);
        }

        let message = format!("Unpacking {} to {} on {node}", variant.url, dir.display());
        let fresh = self
            .transfer
            .install_if_necessary_from(&variant.url, dir, sink, &message)
            .await
            .map_err(|e| InstallError::transfer_failed(&variant.url, format!("{e:#}")))?;

        if !fresh {
            tracing::debug!(url = %variant.url, "transfer reported no change");
            return Ok(InstallOutcome::Unchanged);
        }

        remove_if_exists(&dir.join(TIMESTAMP_FILE))?;
        if let Some(base) = find_pull_up_directory(dir)? {
            move_children_up(&base, dir)?;
        }
        self.records.record(dir, &variant.url)?;

        tracing::info!(url = %variant.url, dir = %dir.display(), "installed Go toolchain");
        Ok(InstallOutcome::Installed)
    }
}

fn remove_if_exists(path: &Path) -> Result<(), InstallError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(InstallError::io(format!("failed to remove {}", path.display()), e)),
    }
}

/// Returns the wrapping directory of `dir`: its only entry, if that is a
/// directory.
fn find_pull_up_directory(dir: &Path) -> Result<Option<PathBuf>, InstallError> {
    let read_err = |e| InstallError::io(format!("failed to read {}", dir.display()), e);
    let entries = std::fs::read_dir(dir)
        .map_err(read_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;

    let [only] = entries.as_slice() else {
        return Ok(None);
    };
    let is_dir = only.file_type().map_err(read_err)?.is_dir();
    Ok(is_dir.then(|| only.path()))
}

/// Moves every entry of `base` into `dir`, then removes `base`.
fn move_children_up(base: &Path, dir: &Path) -> Result<(), InstallError> {
    // Rename first so a child with the wrapper's own name (go/go) cannot clash.
    let staging = dir.join(format!(
        ".{}.pullup",
        base.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned())
    ));
    std::fs::rename(base, &staging).map_err(|e| {
        InstallError::io(format!("failed to move {}", base.display()), e)
    })?;

    let entries = std::fs::read_dir(&staging)
        .map_err(|e| InstallError::io(format!("failed to read {}", staging.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| InstallError::io(format!("failed to read {}", staging.display()), e))?;
        let target = dir.join(entry.file_name());
        std::fs::rename(entry.path(), &target).map_err(|e| {
            InstallError::io(format!("failed to move {}", entry.path().display()), e)
        })?;
    }

    std::fs::remove_dir(&staging)
        .map_err(|e| InstallError::io(format!("failed to remove {}", staging.display()), e))?;
    tracing::debug!(from = %base.display(), to = %dir.display(), "flattened wrapping directory");
    Ok(())
}
