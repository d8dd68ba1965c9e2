//! Cache Store Module
//!
//! Insertion-ordered entry map for a single cache generation, optionally
//! mirrored to an [`EntryDir`] on disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, EntryDir, InsertionOrder, MAX_BODY_SIZE};
use crate::error::StoreError;
use crate::models::{RequestKey, ResponsePayload};

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<RequestKey, CacheEntry>,
    order: InsertionOrder,
    next_rank: u64,
}

// == Store ==
/// Ordered key to entry map owned by one generation.
///
/// Every method takes the internal lock once, so individual calls are
/// linearizable. There are no cross-call transactions: a `get` followed by a
/// `put` may interleave with other callers.
///
/// A persistent store writes each entry to disk before it becomes visible
/// in memory. A cancelled `put` leaves either nothing or a complete entry
/// file, which the next load picks up.
#[derive(Debug)]
pub struct Store {
    name: String,
    inner: RwLock<StoreInner>,
    retired: AtomicBool,
    entry_quota: usize,
    dir: Option<EntryDir>,
}

impl Store {
    // == Constructor ==
    /// Creates an empty store with the default per-entry quota.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_entry_quota(name, MAX_BODY_SIZE)
    }

    /// Creates an empty store rejecting bodies larger than `entry_quota` bytes.
    pub fn with_entry_quota(name: impl Into<String>, entry_quota: usize) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(StoreInner::default()),
            retired: AtomicBool::new(false),
            entry_quota,
            dir: None,
        }
    }

    /// Opens a persistent store backed by `dir`, restoring whatever entries
    /// it already holds in their original order.
    pub async fn open_dir(name: impl Into<String>, dir: EntryDir) -> Result<Self, StoreError> {
        let mut inner = StoreInner::default();

        for entry in dir.load().await? {
            inner.next_rank = entry.rank + 1;
            inner.order.push_newest(&entry.key);
            // An interrupted upsert can leave the older copy behind
            if let Some(stale) = inner.entries.insert(entry.key.clone(), entry) {
                dir.remove(stale.rank).await;
            }
        }
        debug!(dir = %dir.path().display(), entries = inner.entries.len(), "store restored");

        Ok(Self {
            name: name.into(),
            inner: RwLock::new(inner),
            retired: AtomicBool::new(false),
            entry_quota: MAX_BODY_SIZE,
            dir: Some(dir),
        })
    }

    /// Name of the generation this store belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    // == Get ==
    /// Retrieves an entry by key. Does not affect eviction order.
    pub async fn get(&self, key: &RequestKey) -> Option<CacheEntry> {
        self.inner.read().await.entries.get(key).cloned()
    }

    // == Put ==
    /// Upserts an entry and moves its key to the newest position.
    ///
    /// On error the store is left unchanged.
    pub async fn put(&self, key: RequestKey, payload: ResponsePayload) -> Result<(), StoreError> {
        if payload.size() > self.entry_quota {
            return Err(StoreError::QuotaExceeded {
                size: payload.size(),
                limit: self.entry_quota,
            });
        }

        let mut inner = self.inner.write().await;

        // Checked under the lock so a concurrent purge never misses this write
        if self.is_retired() {
            return Err(StoreError::Retired(self.name.clone()));
        }

        let rank = inner.next_rank;
        inner.next_rank += 1;
        let entry = CacheEntry::new(key.clone(), payload, rank);

        if let Some(dir) = &self.dir {
            dir.write(&entry).await?;
        }

        inner.order.push_newest(&key);
        let previous = inner.entries.insert(key, entry);

        if let (Some(dir), Some(previous)) = (&self.dir, previous) {
            dir.remove(previous.rank).await;
        }

        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub async fn delete(&self, key: &RequestKey) -> bool {
        let mut inner = self.inner.write().await;
        match inner.entries.remove(key) {
            Some(entry) => {
                inner.order.remove(key);
                if let Some(dir) = &self.dir {
                    dir.remove(entry.rank).await;
                }
                true
            }
            None => false,
        }
    }

    // == Keys ==
    /// Returns all keys, oldest insertion first.
    pub async fn keys(&self) -> Vec<RequestKey> {
        self.inner.read().await.order.keys()
    }

    // == Clear ==
    /// Removes every entry. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let removed: Vec<CacheEntry> = inner.entries.drain().map(|(_, entry)| entry).collect();
        inner.order.clear();

        if let Some(dir) = &self.dir {
            for entry in &removed {
                dir.remove(entry.rank).await;
            }
        }

        debug!(store = %self.name, removed = removed.len(), "store cleared");
        removed.len()
    }

    /// Retires and clears the store, then deletes its directory if it has one.
    pub async fn destroy(&self) -> usize {
        self.retire();
        let cleared = self.clear().await;
        if let Some(dir) = &self.dir {
            dir.destroy().await;
        }
        cleared
    }

    pub fn is_persistent(&self) -> bool {
        self.dir.is_some()
    }

    // == Retire ==
    /// Marks the store as belonging to a purged generation.
    ///
    /// Later writes fail with [`StoreError::Retired`]; reads keep working.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    // == Length ==
    /// Returns the current number of entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}
