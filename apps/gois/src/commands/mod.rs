//! Command modules for the gois CLI.
//!
//! - [`list`] - List catalog releases and configured installations
//! - [`select`] - Show the archive a release would install
//! - [`install`] - Install a configured installation
//! - [`env`] - Print the environment of an installation

pub mod env;
pub mod install;
pub mod list;
pub mod select;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use goinstall::{GoisConfig, InstallError, ReleaseCatalog, ToolPaths};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// Explicit catalog file.
    pub catalog: Option<PathBuf>,
}

/// Configuration, paths and catalog resolved for one invocation.
#[derive(Debug)]
pub struct Session {
    pub config_path: PathBuf,
    pub config: GoisConfig,
    pub paths: ToolPaths,
    pub catalog_path: PathBuf,
    pub catalog: Option<ReleaseCatalog>,
    /// Why an existing catalog file was ignored, if it was.
    pub catalog_problem: Option<InstallError>,
}

impl Session {
    /// Loads the configuration and catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or a file
    /// exists but is invalid.
    pub fn load(globals: &GlobalArgs) -> Result<Self> {
        let base = ToolPaths::new()?;

        let config_path = globals.config.clone().unwrap_or_else(|| base.config_file());
        let config = GoisConfig::load(&config_path)
            .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;

        let paths = config.tool_paths(&base);
        let catalog_path = globals
            .catalog
            .clone()
            .unwrap_or_else(|| config.catalog_path(&base));
        // A catalog that does not parse counts as absent, so installs fall
        // through to the unknown-release path instead of aborting.
        let (catalog, catalog_problem) = match ReleaseCatalog::load(&catalog_path) {
            Ok(catalog) => (catalog, None),
            Err(e @ InstallError::InvalidCatalog { .. }) => {
                tracing::warn!(
                    catalog = %catalog_path.display(),
                    error = %e,
                    "ignoring unparsable release catalog"
                );
                (None, Some(e))
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to load release catalog {}", catalog_path.display())
                });
            }
        };

        tracing::debug!(
            config = %config_path.display(),
            catalog = %catalog_path.display(),
            root = %paths.root.display(),
            "session loaded"
        );

        Ok(Self {
            config_path,
            config,
            paths,
            catalog_path,
            catalog,
            catalog_problem,
        })
    }

    /// Returns the catalog, failing if it has not been provided.
    ///
    /// # Errors
    ///
    /// Returns an error if no catalog file exists or it could not be parsed.
    pub fn require_catalog(&self) -> Result<&ReleaseCatalog> {
        if let Some(problem) = &self.catalog_problem {
            bail!("{problem}");
        }
        self.catalog.as_ref().with_context(|| {
            format!("No release catalog found at {}", self.catalog_path.display())
        })
    }
}
