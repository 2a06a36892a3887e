//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by key-value storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing file could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backing file holds something other than a string map.
    #[error("Corrupt storage file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
