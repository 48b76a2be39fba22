// error.rs — Error types for session persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving a session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The session file is not valid JSON.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The session file holds JSON, but not a top-level object.
    #[error("session file {path} must contain a JSON object, found {found}")]
    NotAnObject { path: PathBuf, found: String },
}
