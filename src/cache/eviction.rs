//! Eviction Policy
//!
//! Oldest-first (FIFO) capacity enforcement over a store's insertion order.

use tracing::debug;

use crate::cache::Store;

// == Evict If Needed ==
/// Removes the oldest entries until `store` holds at most `max_items`.
///
/// Order comes solely from [`Store::keys`], so reads never influence which
/// entry goes first. Concurrent callers may both try to remove the same key;
/// `delete` is idempotent and the loop re-reads the keys, so the store still
/// converges to capacity.
///
/// Returns the number of entries this call removed.
pub async fn evict_if_needed(store: &Store, max_items: usize) -> usize {
    let mut evicted = 0;

    loop {
        let keys = store.keys().await;
        if keys.len() <= max_items {
            break;
        }

        let excess = keys.len() - max_items;
        for key in keys.into_iter().take(excess) {
            if store.delete(&key).await {
                debug!(store = %store.name(), key = %key, "evicted oldest entry");
                evicted += 1;
            }
        }
    }

    evicted
}
