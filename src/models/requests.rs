//! Request models
//!
//! Defines intercepted requests, their normalized cache identity, and the
//! query string accepted by the fetch endpoint.

use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{CacheError, Result};

// == Request Key ==
/// Normalized identity of a request: method plus absolute URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Request method
    pub method: Method,
    /// Absolute URL, fragment stripped
    pub url: String,
}

impl RequestKey {
    /// Builds a key from a method and an already parsed URL.
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);

        Self {
            method,
            url: url.into(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// == Fetch Request ==
/// An intercepted outbound request.
///
/// Only method, URL and headers are relevant; request bodies are never cached
/// or inspected.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request method
    pub method: Method,
    /// Absolute http(s) URL
    pub url: Url,
    /// Headers forwarded to the origin
    pub headers: HeaderMap,
}

impl FetchRequest {
    /// Creates a request, validating that the URL is absolute http or https.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| CacheError::InvalidRequest(format!("invalid url '{}': {}", url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(CacheError::InvalidRequest(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
        })
    }

    /// Shorthand for a GET request.
    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Adds a header forwarded to the origin.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the forwarded header set.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns true for the only method the cache ever intervenes on.
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Normalized cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }
}

// == Fetch Query ==
/// Query string of the fetch endpoint (`/fetch?url=...`).
#[derive(Debug, Clone, Deserialize)]
pub struct FetchQuery {
    /// Absolute URL to fetch through the cache
    pub url: String,
}

impl FetchQuery {
    /// Validates the query data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return Some("url cannot be empty".to_string());
        }
        None
    }
}
