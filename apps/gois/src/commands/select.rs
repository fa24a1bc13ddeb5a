//! Select command for the gois CLI.
//!
//! Prints the URL of the archive a release would install, without installing
//! it. The current machine is described as usual; each field can be replaced
//! to ask about another machine.
//!
//! ## Usage
//!
//! ```bash
//! gois select 1.22.5
//! gois select 1.4.3 --os "Mac OS X" --arch x86_64 --os-version 10.11.12
//! ```

use anyhow::{Context, Result};
use clap::Args;
use goinstall::{LocalMachine, MachineProbe, select_variant};

use super::{GlobalArgs, Session};

/// Arguments for the select command.
#[derive(Args)]
pub struct SelectArgs {
    /// Release id from the catalog (e.g., "1.22.5").
    pub release: String,

    /// OS name to select for (e.g., "Linux", "Mac OS X").
    #[clap(long = "os")]
    pub os_name: Option<String>,

    /// CPU architecture to select for (e.g., "amd64", "aarch64").
    #[clap(long)]
    pub arch: Option<String>,

    /// OS version to select for (e.g., "10.11.12").
    #[clap(long)]
    pub os_version: Option<String>,
}

/// Executes the select command.
///
/// # Errors
///
/// Returns an error if the catalog is missing, the release is unknown, the
/// machine is unsupported, or the release has no matching archive.
pub fn execute(globals: &GlobalArgs, args: &SelectArgs) -> Result<()> {
    let session = Session::load(globals)?;
    let catalog = session.require_catalog()?;
    let release = catalog
        .find_release(&args.release)
        .with_context(|| format!("Unknown release id: {}", args.release))?;

    let mut machine = LocalMachine.describe()?;
    if let Some(os_name) = &args.os_name {
        machine.os_name.clone_from(os_name);
    }
    if let Some(arch) = &args.arch {
        machine.arch.clone_from(arch);
    }
    if args.os_version.is_some() {
        machine.os_version.clone_from(&args.os_version);
    }

    let variant = select_variant(
        release,
        &machine.os_name,
        &machine.arch,
        machine.os_version.as_deref(),
    )?;
    println!("{}", variant.url);

    Ok(())
}
