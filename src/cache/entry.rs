//! Cache Entry Module
//!
//! Defines the structure for individual cache entries.

use chrono::{DateTime, Utc};

use crate::models::{RequestKey, ResponsePayload};

// == Cache Entry ==
/// A stored response together with its identity and ordering metadata.
///
/// Entries never expire; they leave a store only through eviction, delete or
/// generation purge.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Normalized request identity
    pub key: RequestKey,
    /// The stored response
    pub payload: ResponsePayload,
    /// Insertion rank within the owning store, higher is newer
    pub rank: u64,
    /// Wall-clock time the entry was written
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `key` - The request identity
    /// * `payload` - The response to store
    /// * `rank` - Insertion rank assigned by the store
    pub fn new(key: RequestKey, payload: ResponsePayload, rank: u64) -> Self {
        Self {
            key,
            payload,
            rank,
            stored_at: Utc::now(),
        }
    }

    /// Age of the entry, informational only.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.stored_at
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchRequest;
    use axum::http::StatusCode;

    #[test]
    fn test_entry_creation() {
        let key = FetchRequest::get("https://tile.openstreetmap.org/3/4/2.png")
            .unwrap()
            .key();
        let payload = ResponsePayload::new(StatusCode::OK).with_body("png");
        let entry = CacheEntry::new(key.clone(), payload, 7);

        assert_eq!(entry.key, key);
        assert_eq!(entry.rank, 7);
        assert_eq!(&entry.payload.body[..], b"png");
        assert!(entry.stored_at <= Utc::now());
    }

    #[test]
    fn test_entry_age_is_non_negative() {
        let key = FetchRequest::get("https://example.com/").unwrap().key();
        let entry = CacheEntry::new(key, ResponsePayload::new(StatusCode::OK), 0);
        assert!(entry.age() >= chrono::Duration::zero());
    }
}
