//! Cache Write Task
//!
//! Writes an admitted network response into a store and re-establishes the
//! capacity bound, either inline or from a spawned task.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{evict_if_needed, StatsRecorder, Store};
use crate::models::{RequestKey, ResponsePayload};

/// An admitted response waiting to be stored.
#[derive(Debug, Clone)]
pub struct CacheWrite {
    /// Store of the generation that was current when the request started
    pub store: Arc<Store>,
    pub key: RequestKey,
    pub payload: ResponsePayload,
    /// Capacity enforced right after the put
    pub max_items: usize,
    pub stats: Arc<StatsRecorder>,
}

/// Puts the entry, then evicts down to capacity.
///
/// Store failures are logged and counted, never propagated: the caller has
/// already been given the network response. Returns whether the entry was
/// written.
pub async fn write_entry(write: CacheWrite) -> bool {
    let CacheWrite {
        store,
        key,
        payload,
        max_items,
        stats,
    } = write;

    if let Err(e) = store.put(key.clone(), payload).await {
        stats.record_store_error();
        warn!(store = %store.name(), key = %key, error = %e, "cache write failed");
        return false;
    }
    stats.record_admitted();

    let evicted = evict_if_needed(&store, max_items).await;
    stats.record_evictions(evicted);

    debug!(store = %store.name(), key = %key, evicted, "response cached");
    true
}

/// Spawns [`write_entry`] so the response can be returned without waiting.
///
/// The put is a single critical section, so aborting the returned handle
/// never leaves a partial entry behind. An abort between put and eviction can
/// leave the store one over capacity until the next write evicts.
///
/// # Example
/// ```ignore
/// let handle = spawn_cache_write(write);
/// // The response is already on its way to the caller
/// handle.await?;
/// ```
pub fn spawn_cache_write(write: CacheWrite) -> JoinHandle<()> {
    tokio::spawn(async move {
        write_entry(write).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntryDir;
    use crate::models::FetchRequest;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    fn write_for(store: &Arc<Store>, n: usize, stats: &Arc<StatsRecorder>) -> CacheWrite {
        CacheWrite {
            store: store.clone(),
            key: FetchRequest::get(&format!("https://tile.openstreetmap.org/2/{}/0.png", n))
                .unwrap()
                .key(),
            payload: ResponsePayload::new(StatusCode::OK).with_body("tile"),
            max_items: 2,
            stats: stats.clone(),
        }
    }

    #[tokio::test]
    async fn test_write_entry_stores_and_evicts() {
        let store = Arc::new(Store::new("test"));
        let stats = Arc::new(StatsRecorder::new());

        for n in 0..3 {
            assert!(write_entry(write_for(&store, n, &stats)).await);
        }

        assert_eq!(store.len().await, 2);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.admitted, 3);
        assert_eq!(snapshot.evictions, 1);
    }

    #[tokio::test]
    async fn test_write_entry_failure_is_counted() {
        let store = Arc::new(Store::new("retired"));
        store.retire();
        let stats = Arc::new(StatsRecorder::new());

        assert!(!write_entry(write_for(&store, 0, &stats)).await);

        assert!(store.is_empty().await);
        assert_eq!(stats.snapshot().store_errors, 1);
        assert_eq!(stats.snapshot().admitted, 0);
    }

    #[tokio::test]
    async fn test_spawned_write_completes() {
        let store = Arc::new(Store::new("test"));
        let stats = Arc::new(StatsRecorder::new());

        let handle = spawn_cache_write(write_for(&store, 0, &stats));
        handle.await.unwrap();

        assert_eq!(store.len().await, 1);
    }

    /// Aborts a spawned write into a full store and checks the entry is
    /// either fully there or absent, and that the next write restores the
    /// capacity bound.
    async fn assert_abort_is_all_or_nothing(store: Arc<Store>) {
        let stats = Arc::new(StatsRecorder::new());
        for n in 0..2 {
            assert!(write_entry(write_for(&store, n, &stats)).await);
        }

        let write = write_for(&store, 7, &stats);
        let key = write.key.clone();
        let handle = spawn_cache_write(write);
        handle.abort();
        let _ = handle.await;

        let keys = store.keys().await;
        assert_eq!(keys.len(), store.len().await);
        match store.get(&key).await {
            Some(entry) => {
                assert_eq!(&entry.payload.body[..], b"tile");
                assert!(keys.contains(&key));
            }
            None => assert!(!keys.contains(&key)),
        }

        assert!(write_entry(write_for(&store, 8, &stats)).await);
        assert!(store.len().await <= 2);
    }

    #[tokio::test]
    async fn test_aborted_write_is_all_or_nothing() {
        assert_abort_is_all_or_nothing(Arc::new(Store::new("test"))).await;
    }

    #[tokio::test]
    async fn test_aborted_persistent_write_is_all_or_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = EntryDir::create(temp_dir.path()).await.unwrap();
        let store = Arc::new(Store::open_dir("test", dir.clone()).await.unwrap());

        assert_abort_is_all_or_nothing(store).await;

        // Whatever reached disk is complete
        for entry in dir.load().await.unwrap() {
            assert_eq!(&entry.payload.body[..], b"tile");
        }
    }
}
