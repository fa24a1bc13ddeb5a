//! Install command for the gois CLI.
//!
//! Installs the release configured for a named installation and prints the
//! installation directory on stdout. Progress goes to stderr.
//!
//! ## Usage
//!
//! ```bash
//! gois install go1.22
//! ```

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use goinstall::{
    GoInstaller, HttpArchiveTransfer, InstallOutcome, InstallReport, LocalMachine, StderrSink,
};

use super::{GlobalArgs, Session};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Name of an installation configured in gois.toml.
    pub installation: String,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if the installation is not configured or the install
/// fails. An unknown release id is reported but is not an error.
pub async fn execute(globals: &GlobalArgs, args: &InstallArgs) -> Result<()> {
    let session = Session::load(globals)?;
    let report = ensure_installed(&session, &args.installation).await?;

    if report.outcome == InstallOutcome::AlreadyUpToDate {
        eprintln!("{} is up to date.", args.installation);
    }
    println!("{}", report.path.display());

    Ok(())
}

/// Installs the named installation using the session's configuration.
///
/// # Errors
///
/// Returns an error if the installation is not configured or the install
/// fails.
pub async fn ensure_installed(session: &Session, name: &str) -> Result<InstallReport> {
    let installation = session.config.installation(name).with_context(|| {
        format!(
            "No installation named '{name}' in {}",
            session.config_path.display()
        )
    })?;
    let env_vars: BTreeMap<String, String> = std::env::vars().collect();
    let installation = installation.for_environment(&env_vars);

    let installer = GoInstaller::new(&installation.release, HttpArchiveTransfer::new());
    let report = installer
        .install(
            &installation,
            &session.paths,
            session.catalog.as_ref(),
            &LocalMachine,
            &StderrSink,
        )
        .await
        .with_context(|| format!("Could not install Go for '{name}'"))?;

    tracing::info!(
        installation = name,
        release = installer.release_id(),
        outcome = %report.outcome,
        path = %report.path.display(),
        "install finished"
    );
    Ok(report)
}
