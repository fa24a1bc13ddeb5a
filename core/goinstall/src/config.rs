//! Configuration file handling.
//!
//! The configuration lives in `gois.toml` in the root directory and is only
//! ever read:
//!
//! ```toml
//! root = "/var/lib/gois"        # tool root, defaults to the GOIS_HOME directory
//! catalog = "catalog.json"      # relative paths resolve against GOIS_HOME
//!
//! [[installation]]
//! name = "go1.22"
//! release = "1.22.5"
//! home = "/opt/go"              # optional
//! ```
//!
//! `GOIS_CATALOG` overrides the catalog location.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::InstallError;
use crate::installation::{Installation, find_installation};
use crate::paths::ToolPaths;

/// Environment variable overriding the catalog file.
pub const GOIS_CATALOG_ENV: &str = "GOIS_CATALOG";

/// Parsed `gois.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GoisConfig {
    /// Tool root directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Catalog file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    /// Configured installations.
    #[serde(default, rename = "installation", skip_serializing_if = "Vec::is_empty")]
    pub installations: Vec<Installation>,
}

impl GoisConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Config`] if the document is not valid.
    pub fn from_toml_str(content: &str) -> Result<Self, InstallError> {
        toml::from_str(content).map_err(|e| InstallError::config(e.to_string()))
    }

    /// Loads the configuration from `path`. A missing file yields the empty
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, InstallError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| match e {
                InstallError::Config { message } => {
                    InstallError::config(format!("{}: {message}", path.display()))
                }
                other => other,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(InstallError::io(
                format!("failed to read configuration {}", path.display()),
                e,
            )),
        }
    }

    /// Resolves the tool paths: the configured root, else `base`.
    #[must_use]
    pub fn tool_paths(&self, base: &ToolPaths) -> ToolPaths {
        match &self.root {
            Some(root) => ToolPaths::with_root(base.root.join(root)),
            None => base.clone(),
        }
    }

    /// Resolves the catalog file: `GOIS_CATALOG`, else the configured path
    /// relative to `base`, else `base`'s default catalog file.
    #[must_use]
    pub fn catalog_path(&self, base: &ToolPaths) -> PathBuf {
        if let Some(path) = std::env::var_os(GOIS_CATALOG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        match &self.catalog {
            Some(path) => base.root.join(path),
            None => base.catalog_file(),
        }
    }

    /// Finds a configured installation by name.
    #[must_use]
    pub fn installation(&self, name: &str) -> Option<&Installation> {
        find_installation(&self.installations, name)
    }
}
