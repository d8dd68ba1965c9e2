//! Response models
//!
//! Defines cached response payloads and the bodies of the informational
//! endpoints.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::generation::GenerationState;

// == Response Payload ==
/// A full response as returned by the origin and stored in the cache.
///
/// The body is reference-counted, so clones handed to the store and to the
/// caller share the same bytes.
#[derive(Debug, Clone)]
pub struct ResponsePayload {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Opaque body bytes
    pub body: Bytes,
}

impl ResponsePayload {
    /// Creates an empty payload with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Body length in bytes.
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Request outcome counters
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Entries in the current generation's store
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: CacheStats, total_entries: usize) -> Self {
        let hit_rate = stats.hit_rate();
        Self {
            stats,
            total_entries,
            hit_rate,
        }
    }
}

/// Response body for the generation endpoint (GET /generation)
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    /// Label of the current generation, if activation finished
    pub label: Option<String>,
    /// Lifecycle state of the generation manager
    pub state: GenerationState,
    /// Entries in the current generation's store
    pub entries: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_builder() {
        let payload = ResponsePayload::new(StatusCode::OK)
            .with_body("tile")
            .with_header(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("image/png"),
            );
        assert_eq!(payload.status, StatusCode::OK);
        assert_eq!(payload.size(), 4);
        assert_eq!(payload.headers.get("content-type").unwrap(), "image/png");
    }

    #[test]
    fn test_payload_clone_shares_body() {
        let payload = ResponsePayload::new(StatusCode::OK).with_body(vec![7u8; 1024]);
        let copy = payload.clone();
        assert_eq!(copy.body.as_ptr(), payload.body.as_ptr());
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::new(stats, 100);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"hits\":80"));
        assert!(json.contains("\"total_entries\":100"));
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::new(CacheStats::default(), 0);
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_generation_response_serialize() {
        let resp = GenerationResponse {
            label: Some("map-cache-v1".to_string()),
            state: GenerationState::Active,
            entries: 3,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("map-cache-v1"));
        assert!(json.contains("\"active\""));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
