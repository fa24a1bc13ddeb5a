//! Platform normalization and machine descriptors.
//!
//! Machines describe themselves with free-form strings in the style of the
//! `os.name` / `os.arch` / `os.version` system properties (`"Mac OS X"`,
//! `"x86_64"`, `"10.11.12"`). Go archives name their targets with a small
//! closed vocabulary (`darwin`, `amd64`). This module maps the former onto the
//! latter.
//!
//! ## Normalization
//!
//! Matching is case-insensitive substring matching, first match wins:
//!
//! | Raw value contains            | Token     |
//! |-------------------------------|-----------|
//! | `freebsd`                     | `freebsd` |
//! | `linux`                       | `linux`   |
//! | `os x`                        | `darwin`  |
//! | `windows`                     | `windows` |
//!
//! | Raw value contains            | Token     |
//! |-------------------------------|-----------|
//! | `amd64`, `86_64`              | `amd64`   |
//! | `86`                          | `386`     |
//! | `s390x`                       | `s390x`   |
//! | `arm64`, `aarch64`            | `arm64`   |
//! | `arm`, `aarch32`              | `arm`     |

use std::env::VarError;
use std::fmt;
use std::process::Command;

use crate::errors::InstallError;

/// Environment variable overriding the reported OS name.
pub const OS_NAME_ENV: &str = "GOIS_OS_NAME";

/// Environment variable overriding the reported CPU architecture.
pub const OS_ARCH_ENV: &str = "GOIS_OS_ARCH";

/// Environment variable overriding the reported OS version.
pub const OS_VERSION_ENV: &str = "GOIS_OS_VERSION";

/// Canonical platform token, as used in Go archive file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformToken {
    /// FreeBSD
    FreeBsd,
    /// Linux
    Linux,
    /// macOS
    Darwin,
    /// Windows
    Windows,
}

impl PlatformToken {
    /// Returns the token string used in the catalog.
    #[must_use = "returns the token string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreeBsd => "freebsd",
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for PlatformToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical CPU architecture token, as used in Go archive file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchToken {
    /// 64-bit x86
    Amd64,
    /// 32-bit x86
    I386,
    /// IBM Z
    S390x,
    /// 64-bit ARM
    Arm64,
    /// 32-bit ARM
    Arm,
}

impl ArchToken {
    /// Returns the token string used in the catalog.
    #[must_use = "returns the token string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::I386 => "386",
            Self::S390x => "s390x",
            Self::Arm64 => "arm64",
            Self::Arm => "arm",
        }
    }
}

impl fmt::Display for ArchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps a raw OS name to its platform token.
///
/// # Errors
///
/// Returns [`InstallError::UnsupportedPlatform`] if the name contains none of
/// the recognised substrings.
pub fn normalize_platform(raw: &str) -> Result<PlatformToken, InstallError> {
    let value = raw.to_lowercase();
    if value.contains("freebsd") {
        return Ok(PlatformToken::FreeBsd);
    }
    if value.contains("linux") {
        return Ok(PlatformToken::Linux);
    }
    if value.contains("os x") {
        return Ok(PlatformToken::Darwin);
    }
    if value.contains("windows") {
        return Ok(PlatformToken::Windows);
    }
    Err(InstallError::unsupported_platform(raw))
}

/// Maps a raw CPU architecture to its architecture token.
///
/// # Errors
///
/// Returns [`InstallError::UnsupportedArchitecture`] if the value contains none
/// of the recognised substrings.
pub fn normalize_arch(raw: &str) -> Result<ArchToken, InstallError> {
    let value = raw.to_lowercase();
    if value.contains("amd64") || value.contains("86_64") {
        return Ok(ArchToken::Amd64);
    }
    if value.contains("86") {
        return Ok(ArchToken::I386);
    }
    if value.contains("s390x") {
        return Ok(ArchToken::S390x);
    }
    if value.contains("arm64") || value.contains("aarch64") {
        return Ok(ArchToken::Arm64);
    }
    // `armv6l`, `armv7a` etc. are covered by the `arm` substring
    if value.contains("arm") || value.contains("aarch32") {
        return Ok(ArchToken::Arm);
    }
    Err(InstallError::unsupported_architecture(raw))
}

/// Raw platform description of the machine a toolchain is installed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineDescriptor {
    /// Raw OS name, e.g. `"Mac OS X"`.
    pub os_name: String,
    /// Raw CPU architecture, e.g. `"x86_64"`.
    pub arch: String,
    /// Raw OS version, e.g. `"10.11.12"`, if the machine reported one.
    pub os_version: Option<String>,
}

impl MachineDescriptor {
    /// Creates a descriptor from raw values.
    #[must_use]
    pub fn new(
        os_name: impl Into<String>,
        arch: impl Into<String>,
        os_version: Option<impl Into<String>>,
    ) -> Self {
        Self {
            os_name: os_name.into(),
            arch: arch.into(),
            os_version: os_version.map(Into::into),
        }
    }
}

impl fmt::Display for MachineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.os_version {
            Some(version) => write!(f, "{} {} ({})", self.os_name, version, self.arch),
            None => write!(f, "{} ({})", self.os_name, self.arch),
        }
    }
}

/// Source of the raw descriptor for the machine being installed on.
pub trait MachineProbe: Send + Sync {
    /// Human-readable name of the machine, used in progress messages.
    fn display_name(&self) -> String;

    /// Queries the machine's OS name, architecture and OS version.
    ///
    /// # Errors
    ///
    /// Returns an error if the machine cannot be queried.
    fn describe(&self) -> Result<MachineDescriptor, InstallError>;
}

impl MachineProbe for MachineDescriptor {
    fn display_name(&self) -> String {
        self.to_string()
    }

    fn describe(&self) -> Result<MachineDescriptor, InstallError> {
        Ok(self.clone())
    }
}

/// The machine this process runs on.
///
/// Reports values in the `os.name` / `os.arch` style (`Linux`, `Mac OS X`,
/// `amd64`, `aarch64`). Each field can be overridden through
/// [`OS_NAME_ENV`], [`OS_ARCH_ENV`] and [`OS_VERSION_ENV`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMachine;

impl LocalMachine {
    fn os_name() -> Result<String, InstallError> {
        let detected = || {
            match std::env::consts::OS {
                "linux" => "Linux",
                "macos" => "Mac OS X",
                "windows" => "Windows",
                "freebsd" => "FreeBSD",
                other => other,
            }
            .to_string()
        };
        Ok(env_override(OS_NAME_ENV)?.unwrap_or_else(detected))
    }

    fn arch() -> Result<String, InstallError> {
        let detected = || {
            match std::env::consts::ARCH {
                "x86_64" => "amd64",
                "x86" => "x86",
                other => other,
            }
            .to_string()
        };
        Ok(env_override(OS_ARCH_ENV)?.unwrap_or_else(detected))
    }

    fn os_version() -> Result<Option<String>, InstallError> {
        if let Some(version) = env_override(OS_VERSION_ENV)? {
            return Ok(Some(version));
        }
        let detected = if cfg!(target_os = "macos") {
            command_output("sw_vers", &["-productVersion"])
        } else if cfg!(unix) {
            command_output("uname", &["-r"])
        } else {
            None
        };
        Ok(detected)
    }
}

impl MachineProbe for LocalMachine {
    fn display_name(&self) -> String {
        std::env::var("HOSTNAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| std::env::var("COMPUTERNAME").ok())
            .or_else(|| command_output("uname", &["-n"]))
            .unwrap_or_else(|| "localhost".to_string())
    }

    fn describe(&self) -> Result<MachineDescriptor, InstallError> {
        Ok(MachineDescriptor {
            os_name: Self::os_name()?,
            arch: Self::arch()?,
            os_version: Self::os_version()?,
        })
    }
}

/// Reads an override variable. Unset means no override; a set but blank or
/// non-Unicode value is a misconfiguration.
fn env_override(key: &str) -> Result<Option<String>, InstallError> {
    let problem = match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => return Ok(Some(value)),
        Err(VarError::NotPresent) => return Ok(None),
        Ok(_) => format!("{key} is set but empty"),
        Err(VarError::NotUnicode(_)) => format!("{key} is not valid Unicode"),
    };
    Err(InstallError::machine_probe_failed(
        LocalMachine.display_name(),
        problem,
    ))
}

/// Runs a command and returns its trimmed stdout, if it succeeded.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}
