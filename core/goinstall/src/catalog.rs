//! Release catalog data model.
//!
//! The catalog lists every Go release that can be installed, each with the
//! archives built for it. It is read from the update-centre JSON document:
//!
//! ```json
//! {
//!   "releases": [
//!     {
//!       "id": "1.4.3",
//!       "name": "Go 1.4.3",
//!       "variants": [
//!         { "url": "https://.../go1.4.3.linux-amd64.tar.gz", "os": "linux", "arch": "amd64" },
//!         { "url": "https://.../go1.4.3.darwin-amd64-osx10.8.tar.gz", "os": "darwin", "arch": "amd64", "osxversion": "10.8" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Variant `os` and `arch` values are the canonical tokens produced by
//! [`crate::platform`]. Catalog contents are never mutated after loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::InstallError;

/// A single downloadable archive of a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    /// Download URL of the archive.
    pub url: String,
    /// Canonical platform token, e.g. `darwin`.
    pub os: String,
    /// Canonical architecture token, e.g. `amd64`.
    pub arch: String,
    /// Minimum macOS version the archive supports. `None` means any version.
    #[serde(rename = "osxversion", default, skip_serializing_if = "Option::is_none")]
    pub min_os_version: Option<String>,
}

impl Variant {
    /// Creates a variant without an OS-version constraint.
    #[must_use]
    pub fn new(url: impl Into<String>, os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            os: os.into(),
            arch: arch.into(),
            min_os_version: None,
        }
    }

    /// Sets the minimum OS version.
    #[must_use]
    pub fn with_min_os_version(mut self, version: impl Into<String>) -> Self {
        self.min_os_version = Some(version.into());
        self
    }
}

/// A named Go release and its archives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Stable identifier, e.g. `1.22.5`.
    pub id: String,
    /// Display name, e.g. `Go 1.22.5`.
    pub name: String,
    /// Archives in catalog order.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Release {
    /// Creates a release.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            variants,
        }
    }

    /// Returns the archives of this release in catalog order.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }
}

/// All releases known to the update centre.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseCatalog {
    /// Releases in catalog order.
    #[serde(default)]
    pub releases: Vec<Release>,
}

impl ReleaseCatalog {
    /// Creates a catalog from releases.
    #[must_use]
    pub fn new(releases: Vec<Release>) -> Self {
        Self { releases }
    }

    /// Parses a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::InvalidCatalog`] if the document is not valid
    /// catalog JSON.
    pub fn from_json_str(json: &str) -> Result<Self, InstallError> {
        serde_json::from_str(json)
            .map_err(|e| InstallError::invalid_catalog("<inline>", e.to_string()))
    }

    /// Loads the catalog from a file.
    ///
    /// A missing file means the catalog has not been downloaded yet and yields
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>, InstallError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "release catalog not present");
                return Ok(None);
            }
            Err(e) => {
                return Err(InstallError::io(
                    format!("failed to read release catalog {}", path.display()),
                    e,
                ));
            }
        };

        let catalog: Self = serde_json::from_str(&content)
            .map_err(|e| InstallError::invalid_catalog(path, e.to_string()))?;
        tracing::debug!(
            path = %path.display(),
            releases = catalog.releases.len(),
            "loaded release catalog"
        );
        Ok(Some(catalog))
    }

    /// Finds a release by its id.
    #[must_use]
    pub fn find_release(&self, id: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.id == id)
    }

    /// Returns the ids of all releases in catalog order.
    #[must_use]
    pub fn release_ids(&self) -> Vec<&str> {
        self.releases.iter().map(|r| r.id.as_str()).collect()
    }
}
