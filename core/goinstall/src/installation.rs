//! Named Go installations and the environment they export.
//!
//! An [`Installation`] ties a user-chosen name to a catalog release and,
//! optionally, a fixed home directory. Once installed, a toolchain is made
//! available to later processes through two bindings:
//!
//! | Key               | Value        | Meaning                    |
//! |-------------------|--------------|----------------------------|
//! | `GOROOT`          | `<home>`     | set                        |
//! | `PATH+GOROOT_BIN` | `<home>/bin` | prepend to `PATH`          |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Key of the `GOROOT` binding.
pub const GOROOT: &str = "GOROOT";

/// Key of the binding prepended to `PATH`.
pub const PATH_GOROOT_BIN: &str = "PATH+GOROOT_BIN";

/// A named, configured Go installation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Installation {
    /// Name used to refer to the installation.
    pub name: String,
    /// Catalog release id to install.
    pub release: String,
    /// Fixed installation directory; may reference environment variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

impl Installation {
    /// Creates an installation without a fixed home.
    #[must_use]
    pub fn new(name: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            release: release.into(),
            home: None,
        }
    }

    /// Sets the fixed home directory.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Returns a copy with `$VAR` and `${VAR}` references in `home` expanded
    /// from `env`. Unknown variables are left untouched.
    #[must_use]
    pub fn for_environment(&self, env: &BTreeMap<String, String>) -> Self {
        Self {
            home: self
                .home
                .as_deref()
                .map(|home| expand_vars(home, |key| env.get(key).cloned())),
            ..self.clone()
        }
    }
}

/// Finds an installation by name.
#[must_use]
pub fn find_installation<'a>(installations: &'a [Installation], name: &str) -> Option<&'a Installation> {
    installations.iter().find(|i| i.name == name)
}

/// Expands `$VAR` and `${VAR}` using `lookup`.
fn expand_vars(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (key, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (!key.is_empty()).then(|| lookup(key)).flatten() {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[pos..=pos + consumed]),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}

/// Environment exported by an installed toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEnvironment {
    home: PathBuf,
}

impl ToolEnvironment {
    /// Creates the environment for a toolchain installed at `home`.
    #[must_use]
    pub fn for_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Returns the toolchain root.
    #[must_use]
    pub fn goroot(&self) -> &Path {
        &self.home
    }

    /// Returns the directory to prepend to `PATH`.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.home.join("bin")
    }

    /// Returns the bindings as `(key, value)` pairs.
    #[must_use]
    pub fn bindings(&self) -> Vec<(&'static str, String)> {
        vec![
            (GOROOT, self.home.display().to_string()),
            (PATH_GOROOT_BIN, self.bin_dir().display().to_string()),
        ]
    }

    /// Applies the bindings to an environment map: sets `GOROOT` and
    /// prepends the `bin` directory to `PATH`.
    pub fn apply_to(&self, env: &mut BTreeMap<String, String>) {
        env.insert(GOROOT.to_string(), self.home.display().to_string());

        let bin = self.bin_dir().display().to_string();
        let path = match env.get("PATH").filter(|p| !p.is_empty()) {
            Some(existing) => format!("{bin}{PATH_SEPARATOR}{existing}"),
            None => bin,
        };
        env.insert("PATH".to_string(), path);
    }
}

#[cfg(windows)]
const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_SEPARATOR: char = ':';
