//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error ==
/// Failures of the underlying entry store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Payload body is larger than a single entry may hold
    #[error("payload of {size} bytes exceeds the {limit} byte entry quota")]
    QuotaExceeded { size: usize, limit: usize },

    /// Store belongs to a purged generation and no longer accepts writes
    #[error("store '{0}' has been retired")]
    Retired(String),

    /// Store name cannot be used as a directory name
    #[error("invalid store name '{0}'")]
    InvalidName(String),

    /// Reading or writing the on-disk copy of a store failed
    #[error("store I/O failed: {0}")]
    Io(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Fetch to the origin failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Persistent store operation failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A precache URL could not be fetched during activation
    #[error("Precache failed for {url}: {reason}")]
    Precache { url: String, reason: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Network(_) | CacheError::Precache { .. } => StatusCode::BAD_GATEWAY,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidState(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Store(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
