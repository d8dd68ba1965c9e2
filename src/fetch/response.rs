//! Fetch responses
//!
//! The result of running a request through the orchestrator, tagged with
//! where it came from.

use axum::http::{header, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::error::CacheError;
use crate::models::ResponsePayload;

/// Header reporting how a proxied response was produced.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

// == Fetch Response ==
/// Outcome of [`FetchOrchestrator::handle`](crate::fetch::FetchOrchestrator::handle).
#[derive(Debug, Clone)]
pub enum FetchResponse {
    /// Served from the current generation's store without a network call
    Cached(ResponsePayload),
    /// Cache miss answered by the origin, whatever its status
    Network(ResponsePayload),
    /// Forwarded to the origin without any cache interaction
    PassThrough(ResponsePayload),
    /// Synthetic failure: the origin could not be reached and nothing was cached
    NetworkError(String),
}

impl FetchResponse {
    /// The response payload, absent for synthetic network errors.
    pub fn payload(&self) -> Option<&ResponsePayload> {
        match self {
            FetchResponse::Cached(payload)
            | FetchResponse::Network(payload)
            | FetchResponse::PassThrough(payload) => Some(payload),
            FetchResponse::NetworkError(_) => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, FetchResponse::Cached(_))
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, FetchResponse::NetworkError(_))
    }

    /// Value of the `x-cache` header for this outcome.
    pub fn cache_status(&self) -> &'static str {
        match self {
            FetchResponse::Cached(_) => "HIT",
            FetchResponse::Network(_) => "MISS",
            FetchResponse::PassThrough(_) => "PASS",
            FetchResponse::NetworkError(_) => "ERROR",
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for FetchResponse {
    fn into_response(self) -> Response {
        let cache_status = HeaderValue::from_static(self.cache_status());

        let mut response = match self {
            FetchResponse::Cached(payload)
            | FetchResponse::Network(payload)
            | FetchResponse::PassThrough(payload) => {
                let mut headers = payload.headers;
                // Framing is re-derived from the buffered body
                headers.remove(header::TRANSFER_ENCODING);
                headers.remove(header::CONNECTION);
                (payload.status, headers, payload.body).into_response()
            }
            FetchResponse::NetworkError(message) => CacheError::Network(message).into_response(),
        };

        response.headers_mut().insert(X_CACHE, cache_status);
        response
    }
}
