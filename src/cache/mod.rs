//! Cache Module
//!
//! Insertion-ordered stores grouped into generations, kept in memory or on
//! disk, with FIFO eviction and an admission filter deciding what gets
//! written.

mod admission;
mod disk;
mod entry;
mod eviction;
mod order;
mod stats;
mod storage;
mod store;


// Re-export public types
pub use admission::{Admission, AdmissionFilter, OriginPattern};
pub use disk::EntryDir;
pub use entry::CacheEntry;
pub use eviction::evict_if_needed;
pub use order::InsertionOrder;
pub use stats::{CacheStats, StatsRecorder};
pub use storage::CacheStorage;
pub use store::Store;

// == Public Constants ==
/// Maximum body size of a single stored response in bytes
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024; // 8 MB
