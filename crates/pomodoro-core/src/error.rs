//! Core error types for pomodoro-core.
//!
//! Two failure families reach callers of the timer engine: storage failures
//! (I/O, malformed JSON, unresolvable data directory) and an inconsistent
//! session mode. Settings updates add a third, validation.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomodoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reading or writing persisted state failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The session's mode is unset or not one of the known modes
    #[error("Invalid mode: {0:?}")]
    InvalidMode(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read, write or create a path
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored document is not valid JSON for its type
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to encode a document before writing
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The application data directory could not be resolved
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),

    /// Backend refused the operation (used by in-memory stores)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Unknown settings key
    #[error("Unknown key: {0}")]
    UnknownKey(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
