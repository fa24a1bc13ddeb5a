//! List command for the gois CLI.
//!
//! ## Output Format
//!
//! ```text
//! Available releases:
//!   1.22.5       Go 1.22.5
//!   1.4.3        Go 1.4.3
//!
//! Configured installations:
//!   go1.22       1.22.5    (installed from https://.../go1.22.5.linux-amd64.tar.gz)
//!   legacy       1.4.3     (not installed)
//! ```

use std::collections::BTreeMap;

use anyhow::Result;
use goinstall::{MarkerFileStore, RecordStore};

use super::{GlobalArgs, Session};

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the catalog cannot be
/// read, or an installation record cannot be read.
pub fn execute(globals: &GlobalArgs) -> Result<()> {
    let session = Session::load(globals)?;

    match &session.catalog {
        Some(catalog) if !catalog.releases.is_empty() => {
            println!("Available releases:");
            for release in &catalog.releases {
                println!("  {:<12} {}", release.id, release.name);
            }
        }
        Some(_) => println!("The release catalog is empty."),
        None => match &session.catalog_problem {
            Some(problem) => println!("The release catalog was ignored: {problem}"),
            None => println!(
                "No release catalog found at {}.",
                session.catalog_path.display()
            ),
        },
    }

    if session.config.installations.is_empty() {
        return Ok(());
    }

    println!();
    println!("Configured installations:");
    let env_vars: BTreeMap<String, String> = std::env::vars().collect();
    for installation in &session.config.installations {
        let installation = installation.for_environment(&env_vars);
        let dir = session
            .paths
            .preferred_location(&installation.name, installation.home.as_deref());
        let status = match MarkerFileStore.installed_from(&dir)? {
            Some(url) => format!("installed from {url}"),
            None => "not installed".to_string(),
        };
        println!(
            "  {:<12} {:<9} ({status})",
            installation.name, installation.release
        );
    }

    Ok(())
}
