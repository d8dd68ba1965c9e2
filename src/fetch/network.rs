//! Network collaborator
//!
//! The origin side of the cache: anything that can turn a request into a
//! response or fail with a network error.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::models::{FetchRequest, ResponsePayload};

/// User agent sent with origin requests.
const USER_AGENT_VALUE: &str = concat!("tile-cache/", env!("CARGO_PKG_VERSION"));

// == Network Trait ==
/// Performs a request against the origin.
///
/// Any HTTP status is a success at this layer; only transport failures
/// (timeouts, connection and DNS errors) return [`CacheError::Network`].
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponsePayload>;
}

// == HTTP Network ==
/// [`Network`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    /// Creates a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| CacheError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponsePayload> {
        debug!(method = %request.method, url = %request.url, "fetching from origin");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| CacheError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Network(format!("failed to read body: {}", e)))?;

        Ok(ResponsePayload {
            status,
            headers,
            body,
        })
    }
}
