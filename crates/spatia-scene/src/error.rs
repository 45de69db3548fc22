//! Error types for spatialization and scene configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by environment and source operations.
///
/// `Range` and `Shape` are caller errors, reported before any state changes.
/// `Internal` means an invariant the engine itself maintains was broken; it is
/// logged at error level where it is raised.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A caller-supplied index or value is outside its valid bounds.
    #[error("range error: {0}")]
    Range(String),

    /// A structural precondition was violated.
    #[error("shape error: {0}")]
    Shape(String),

    /// An engine invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),

    /// Scene configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SpatialError {
    /// Create a range error.
    pub fn range(msg: impl Into<String>) -> Self {
        SpatialError::Range(msg.into())
    }

    /// Create a shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        SpatialError::Shape(msg.into())
    }

    /// Create an internal error, logging it at error level.
    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("internal invariant violated: {msg}");
        SpatialError::Internal(msg)
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A configuration value is out of range
    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid value error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
