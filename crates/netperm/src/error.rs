//! Error types for permission parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while parsing a whitebind or whitelist entry.
///
/// Messages are written for the node operator and can be displayed
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// A name in the permission list is not a known permission.
    #[error("Invalid P2P permission: '{0}'")]
    UnknownPermission(String),

    /// The address or subnet part could not be resolved.
    #[error("{message}")]
    InvalidLocation {
        /// The location text that failed to resolve.
        location: String,
        /// Operator-facing description of the failure.
        message: String,
    },
}

impl PermissionError {
    /// Create an invalid location error.
    pub(crate) fn invalid_location(location: &str, message: String) -> Self {
        Self::InvalidLocation {
            location: location.to_string(),
            message,
        }
    }

    /// Returns `true` if an unknown permission name caused the error.
    pub fn is_unknown_permission(&self) -> bool {
        matches!(self, Self::UnknownPermission(_))
    }

    /// Returns `true` if the location failed to resolve.
    pub fn is_invalid_location(&self) -> bool {
        matches!(self, Self::InvalidLocation { .. })
    }
}

/// Result type for permission parsing.
pub type PermissionResult<T> = std::result::Result<T, PermissionError>;

/// Errors loading or resolving a permission configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML.
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// An entry failed to parse.
    #[error("invalid {option} entry #{index}: {source}")]
    Entry {
        /// The option the entry belongs to (`whitebind` or `whitelist`).
        option: &'static str,
        /// Zero-based position of the entry.
        index: usize,
        /// The underlying parse failure.
        #[source]
        source: PermissionError,
    },
}

impl ConfigError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
