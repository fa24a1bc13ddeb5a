#![warn(clippy::pedantic)]

//! # goinstall
//!
//! Resolves, downloads and caches a Go toolchain for the machine it runs on,
//! then describes the environment that makes the toolchain usable.
//!
//! Given a catalog of releases and the raw platform description of a machine,
//! the installer deterministically picks the right archive, decides whether an
//! existing installation is already up to date, and installs only when needed.
//!
//! ## Module Structure
//!
//! - [`platform`] - Platform normalization and machine descriptors
//! - [`version`] - Dotted version numbers for OS-version gating
//! - [`catalog`] - Release catalog data model
//! - [`selector`] - Variant selection
//! - [`record`] - Installation records (`.installedFrom`)
//! - [`transfer`] - Archive download and unpacking
//! - [`archive`] - tar.gz and zip extraction
//! - [`lock`] - Per-directory install locks
//! - [`paths`] - Installation directory layout
//! - [`installer`] - Install coordination
//! - [`installation`] - Named installations and their environment
//! - [`config`] - `gois.toml` loading
//! - [`sink`] - User-facing progress output
//! - [`errors`] - Error types
//!
//! ## Example
//!
//! ```no_run
//! use goinstall::{
//!     GoInstaller, HttpArchiveTransfer, Installation, LocalMachine, ReleaseCatalog, StderrSink,
//!     ToolEnvironment, ToolPaths,
//! };
//!
//! # async fn run() -> Result<(), goinstall::InstallError> {
//! let paths = ToolPaths::new()?;
//! let catalog = ReleaseCatalog::load(&paths.catalog_file())?;
//! let installation = Installation::new("go1.22", "1.22.5");
//!
//! let installer = GoInstaller::new(&installation.release, HttpArchiveTransfer::new());
//! let report = installer
//!     .install(&installation, &paths, catalog.as_ref(), &LocalMachine, &StderrSink)
//!     .await?;
//!
//! for (key, value) in ToolEnvironment::for_home(&report.path).bindings() {
//!     println!("{key}={value}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod installation;
pub mod installer;
pub mod lock;
pub mod paths;
pub mod platform;
pub mod record;
pub mod selector;
pub mod sink;
pub mod transfer;
pub mod version;

pub use catalog::{Release, ReleaseCatalog, Variant};
pub use config::GoisConfig;
pub use errors::InstallError;
pub use installation::{Installation, ToolEnvironment, find_installation};
pub use installer::{GoInstaller, InstallOutcome, InstallReport};
pub use paths::ToolPaths;
pub use platform::{
    ArchToken, LocalMachine, MachineDescriptor, MachineProbe, PlatformToken, normalize_arch,
    normalize_platform,
};
pub use record::{MarkerFileStore, RecordStore};
pub use selector::{compare_variants, select_variant};
pub use sink::{LogSink, MemorySink, StderrSink};
pub use transfer::{HttpArchiveTransfer, Transfer};
pub use version::VersionNumber;
