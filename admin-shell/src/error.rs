//! Application-wide error types.

use thiserror::Error;

use crate::credentials::StorageError;
use crate::http::ApiError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Route configuration error: {0}")]
    Route(#[from] route_tree::RouteBuildError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Navigation to {path} exceeded {limit} redirects")]
    RedirectLoop { path: String, limit: usize },

    #[error("Result of generation {generation} was superseded by a newer request")]
    Superseded { generation: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the error reflects a deployment mismatch rather than a
    /// condition the user can act on.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(self, Self::Route(_) | Self::Configuration(_))
    }
}
