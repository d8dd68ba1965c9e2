//! Background Tasks Module
//!
//! Work that runs off the request path.
//!
//! # Tasks
//! - Cache write: stores an admitted response and evicts down to capacity

mod write;

pub use write::{spawn_cache_write, write_entry, CacheWrite};
