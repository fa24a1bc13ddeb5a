//! Env command for the gois CLI.
//!
//! Installs a named installation if needed and prints the environment it
//! exports.
//!
//! ## Output Format
//!
//! ```text
//! GOROOT=/home/u/.gois/tools/go/go1.22
//! PATH+GOROOT_BIN=/home/u/.gois/tools/go/go1.22/bin
//! ```
//!
//! With `--shell`, POSIX shell statements that can be `eval`ed:
//!
//! ```text
//! export GOROOT='/home/u/.gois/tools/go/go1.22'
//! export PATH='/home/u/.gois/tools/go/go1.22/bin':"$PATH"
//! ```

use anyhow::Result;
use clap::Args;
use goinstall::ToolEnvironment;

use super::install::ensure_installed;
use super::{GlobalArgs, Session};

/// Arguments for the env command.
#[derive(Args)]
pub struct EnvArgs {
    /// Name of an installation configured in gois.toml.
    pub installation: String,

    /// Print shell `export` statements instead of raw bindings.
    #[clap(long)]
    pub shell: bool,
}

/// Executes the env command.
///
/// # Errors
///
/// Returns an error if the installation is not configured or the install
/// fails.
pub async fn execute(globals: &GlobalArgs, args: &EnvArgs) -> Result<()> {
    let session = Session::load(globals)?;
    let report = ensure_installed(&session, &args.installation).await?;
    let environment = ToolEnvironment::for_home(&report.path);

    if args.shell {
        println!(
            "export GOROOT={}",
            shell_quote(&environment.goroot().display().to_string())
        );
        println!(
            "export PATH={}:\"$PATH\"",
            shell_quote(&environment.bin_dir().display().to_string())
        );
    } else {
        for (key, value) in environment.bindings() {
            println!("{key}={value}");
        }
    }

    Ok(())
}

/// Single-quotes a value for POSIX shells.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
