//! Path management for installed toolchains.
//!
//! The default root directory is `~/.gois/`, which can be overridden by
//! setting the `GOIS_HOME` environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.gois/                  # Root directory (or GOIS_HOME)
//!   gois.toml               # Configuration
//!   catalog.json            # Release catalog
//!   tools/
//!     go/
//!       go1.22/             # One directory per named installation
//!         bin/go
//!         .installedFrom    # Source URL of the installed archive
//!       .go1.22.lock        # Install lock for go1.22/
//! ```
//!
//! An installation with an explicit `home` is placed there instead: as-is if
//! absolute, under `tools/` if relative.

use std::path::{Path, PathBuf};

use crate::errors::InstallError;

/// Environment variable overriding the root directory.
pub const GOIS_HOME_ENV: &str = "GOIS_HOME";

/// Directory under `tools/` that holds installations without an explicit home.
const TOOL_KIND_DIR: &str = "go";

/// Name of the configuration file in the root directory.
const CONFIG_FILE: &str = "gois.toml";

/// Name of the catalog file in the root directory.
const CATALOG_FILE: &str = "catalog.json";

/// Root-relative locations used by the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Root directory (`~/.gois` or `GOIS_HOME`).
    pub root: PathBuf,
    /// Directory holding all tool installations.
    pub tools: PathBuf,
}

impl ToolPaths {
    /// Creates paths rooted at `GOIS_HOME`, or `~/.gois` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `GOIS_HOME` is unset and the home directory cannot
    /// be determined.
    pub fn new() -> Result<Self, InstallError> {
        let root = if let Some(home) = std::env::var_os(GOIS_HOME_ENV).filter(|h| !h.is_empty()) {
            PathBuf::from(home)
        } else {
            dirs::home_dir()
                .ok_or_else(|| {
                    InstallError::config("cannot determine home directory, set GOIS_HOME")
                })?
                .join(".gois")
        };
        Ok(Self::with_root(root))
    }

    /// Creates paths under a specific root directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            tools: root.join("tools"),
            root,
        }
    }

    /// Returns the default configuration file path.
    #[must_use = "returns the path without side effects"]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Returns the default catalog file path.
    #[must_use = "returns the path without side effects"]
    pub fn catalog_file(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    /// Returns the directory an installation should live in.
    ///
    /// `home` takes precedence when set: absolute homes are used verbatim,
    /// relative ones are resolved against `tools/`. Otherwise the
    /// installation goes to `tools/go/<sanitized name>`.
    #[must_use = "returns the path without side effects"]
    pub fn preferred_location(&self, name: &str, home: Option<&str>) -> PathBuf {
        if let Some(home) = home.filter(|h| !h.trim().is_empty()) {
            let home = Path::new(home);
            if home.is_absolute() {
                return home.to_path_buf();
            }
            return self.tools.join(home);
        }
        self.tools.join(TOOL_KIND_DIR).join(sanitize(name))
    }
}

/// Replaces every run of characters outside `[A-Za-z0-9_.-]` with `_`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}
