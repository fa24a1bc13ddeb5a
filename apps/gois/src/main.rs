#![warn(clippy::pedantic)]

//! # Go Installer CLI (gois)
//!
//! The `gois` command installs the Go toolchain release configured for a named
//! installation, picking the archive that matches the machine it runs on, and
//! prints the environment that makes the toolchain usable.
//!
//! ## Subcommands
//!
//! - `list` - List catalog releases and configured installations
//! - `select` - Show which archive a release would install
//! - `install` - Install a named installation
//! - `env` - Install a named installation and print its environment
//!
//! ## Examples
//!
//! Install and activate a toolchain in the current shell:
//! ```bash
//! eval "$(gois env go1.22 --shell)"
//! ```
//!
//! Check which archive a macOS machine would get:
//! ```bash
//! gois select 1.4.3 --os "Mac OS X" --arch x86_64 --os-version 10.11.12
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{env, install, list, select};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "GOIS_LOG";

/// Go toolchain installer.
#[derive(Parser)]
#[command(
    name = "gois",
    author,
    version,
    about = "Installs the Go toolchain matching this machine",
    after_help = "\
ENVIRONMENT VARIABLES:
    GOIS_HOME               Root directory (default: ~/.gois)
    GOIS_CATALOG            Release catalog file (default: $GOIS_HOME/catalog.json)
    GOIS_LOG                Diagnostic log filter (default: warn)
    GOIS_OS_NAME            Override the detected OS name
    GOIS_OS_ARCH            Override the detected CPU architecture
    GOIS_OS_VERSION         Override the detected OS version"
)]
pub struct Cli {
    /// Configuration file (default: $GOIS_HOME/gois.toml).
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Release catalog file.
    #[clap(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the gois CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// List catalog releases and configured installations.
    List,

    /// Show the archive a release would install on a machine.
    ///
    /// Uses the current machine unless overridden with --os, --arch and
    /// --os-version.
    Select(select::SelectArgs),

    /// Install a configured installation.
    ///
    /// Downloads the archive only if the installation directory does not
    /// already hold it, then prints the installation directory.
    Install(install::InstallArgs),

    /// Install a configured installation and print its environment.
    Env(env::EnvArgs),
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints the error and returns the process exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let globals = commands::GlobalArgs {
        config: cli.config,
        catalog: cli.catalog,
    };

    match cli.command {
        Commands::List => list::execute(&globals),
        Commands::Select(args) => select::execute(&globals, &args),
        Commands::Install(args) => install::execute(&globals, &args).await,
        Commands::Env(args) => env::execute(&globals, &args).await,
    }
}
