//! Archive extraction for downloaded Go distributions.
//!
//! Go ships tar.gz archives for Unix-like systems and zip archives for
//! Windows. Both are extracted verbatim into the destination directory; the
//! `go/` wrapping directory every official archive carries is flattened later
//! by the install coordinator.
//!
//! Entries with absolute paths or `..` components are rejected.

use std::io::Read;
use std::path::{Component, Path};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use tar::Archive;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// gzip-compressed tarball (`.tar.gz`, `.tgz`)
    TarGz,
    /// zip archive (`.zip`)
    Zip,
}

impl ArchiveFormat {
    /// Infers the archive format from a file name or URL.
    ///
    /// Query strings and fragments are ignored. Names with an unrecognised
    /// extension are treated as tar.gz, the format of every non-Windows Go
    /// archive.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name
            .split(['?', '#'])
            .next()
            .unwrap_or(name)
            .to_ascii_lowercase();
        if name.ends_with(".zip") {
            Self::Zip
        } else {
            Self::TarGz
        }
    }
}

/// Extracts an archive into `dest_dir`, choosing the format from `name`.
///
/// # Errors
///
/// Returns an error if the archive cannot be read, contains an unsafe path,
/// or an entry cannot be written.
pub fn extract_archive(archive_path: &Path, name: &str, dest_dir: &Path) -> Result<()> {
    match ArchiveFormat::from_name(name) {
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
    }
}

fn ensure_safe(entry_path: &Path) -> Result<()> {
    if entry_path.is_absolute()
        || entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        bail!(
            "Refusing to extract path with parent directory or absolute reference: {}",
            entry_path.display()
        );
    }
    Ok(())
}

/// Extracts a tar.gz archive into `dest_dir`, preserving file modes.
///
/// # Errors
///
/// Returns an error if the archive is malformed or contains an unsafe path.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;

        let entry_path = entry
            .path()
            .context("Failed to get entry path")?
            .into_owned();
        ensure_safe(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);
        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        entry
            .unpack(&output_path)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;
    }

    Ok(())
}

/// Extracts a zip archive into `dest_dir`.
///
/// On Unix, entries that carry a mode keep it.
///
/// # Errors
///
/// Returns an error if the archive is malformed or contains an unsafe path.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;

        let Some(entry_path) = entry.enclosed_name() else {
            bail!(
                "Refusing to extract path with parent directory or absolute reference: {}",
                entry.name()
            );
        };
        ensure_safe(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;
        std::fs::write(&output_path, &contents)
            .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions: {}", output_path.display()))?;
        }
    }

    Ok(())
}
