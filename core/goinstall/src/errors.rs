//! Error types for Go toolchain installation.
//!
//! Every hard failure of an install attempt is an [`InstallError`]. They abort
//! the attempt and propagate to the caller; nothing is retried here. The one
//! soft failure (a release id that the catalog does not know) is not an error
//! at all, see [`crate::installer::InstallOutcome::UnknownRelease`].

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for resolving and installing a toolchain.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The raw OS name does not map to any platform token.
    #[error("unsupported operating system: {os}")]
    UnsupportedPlatform {
        /// The raw OS name as reported by the machine.
        os: String,
    },

    /// The raw CPU architecture does not map to any architecture token.
    #[error("unsupported CPU architecture: {arch}")]
    UnsupportedArchitecture {
        /// The raw architecture as reported by the machine.
        arch: String,
    },

    /// The platform is supported but the release ships nothing for it.
    #[error("{release} has no installation package for {os} ({arch})")]
    NoMatchingVariant {
        /// Display name of the release that was searched.
        release: String,
        /// Raw OS name, followed by the raw OS version when one was known.
        os: String,
        /// Raw CPU architecture.
        arch: String,
    },

    /// Downloading or unpacking the archive failed.
    #[error("failed to install Go from {url}: {message}")]
    TransferFailed {
        /// The source URL of the variant being installed.
        url: String,
        /// The underlying failure, including its cause chain.
        message: String,
    },

    /// The machine descriptor could not be obtained.
    #[error("failed to describe machine {node}: {message}")]
    MachineProbeFailed {
        /// Display name of the machine.
        node: String,
        /// Description of the failure.
        message: String,
    },

    /// The release catalog could not be parsed.
    #[error("invalid release catalog {path}: {message}")]
    InvalidCatalog {
        /// Where the catalog was read from.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },

    /// The configuration could not be read or parsed.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// Filesystem operation on the installation directory failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    /// Creates a new `UnsupportedPlatform` error.
    #[must_use]
    pub fn unsupported_platform(os: impl Into<String>) -> Self {
        Self::UnsupportedPlatform { os: os.into() }
    }

    /// Creates a new `UnsupportedArchitecture` error.
    #[must_use]
    pub fn unsupported_architecture(arch: impl Into<String>) -> Self {
        Self::UnsupportedArchitecture { arch: arch.into() }
    }

    /// Creates a new `NoMatchingVariant` error.
    #[must_use]
    pub fn no_matching_variant(
        release: impl Into<String>,
        os: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self::NoMatchingVariant {
            release: release.into(),
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Creates a new `TransferFailed` error.
    #[must_use]
    pub fn transfer_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransferFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new `MachineProbeFailed` error.
    #[must_use]
    pub fn machine_probe_failed(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MachineProbeFailed {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidCatalog` error.
    #[must_use]
    pub fn invalid_catalog(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns whether this error was raised before the catalog was consulted,
    /// i.e. the machine itself is not a supported target.
    #[must_use]
    pub fn is_unsupported_machine(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. } | Self::UnsupportedArchitecture { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platform_displays_raw_value() {
        let err = InstallError::unsupported_platform("Android");
        assert_eq!(err.to_string(), "unsupported operating system: Android");
        assert!(err.is_unsupported_machine());
    }

    #[test]
    fn unsupported_architecture_displays_raw_value() {
        let err = InstallError::unsupported_architecture("mips");
        assert_eq!(err.to_string(), "unsupported CPU architecture: mips");
        assert!(err.is_unsupported_machine());
    }

    #[test]
    fn no_matching_variant_names_everything_searched_for() {
        let err = InstallError::no_matching_variant("Go 1.4", "Mac OS X 10.5", "x86_64");
        assert_eq!(
            err.to_string(),
            "Go 1.4 has no installation package for Mac OS X 10.5 (x86_64)"
        );
        assert!(!err.is_unsupported_machine());
    }

    #[test]
    fn transfer_failed_includes_underlying_message() {
        let err = InstallError::transfer_failed("https://example.com/go.tar.gz", "HTTP error 404");
        assert_eq!(
            err.to_string(),
            "failed to install Go from https://example.com/go.tar.gz: HTTP error 404"
        );
    }

    #[test]
    fn io_error_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = InstallError::io("failed to write marker", source);
        assert_eq!(err.to_string(), "I/O error: failed to write marker");
        assert!(std::error::Error::source(&err).is_some());
    }
}
