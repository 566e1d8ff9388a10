//! Error types for object storage backends

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures reported by an [`ObjectStore`](super::ObjectStore)
#[derive(Debug, Error)]
pub enum StorageError {
    /// The named object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Object name is not acceptable for this backend
    #[error("Invalid object name: {0}")]
    InvalidName(String),

    /// Filesystem failure in the local backend
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed while listing
    #[error("Failed to walk {root:?}: {message}")]
    Walk { root: PathBuf, message: String },

    /// Transport-level HTTP failure
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Remote backend answered with a non-success status
    #[error("Storage backend returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

impl StorageError {
    /// Whether this error means the object is missing rather than unreachable
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
