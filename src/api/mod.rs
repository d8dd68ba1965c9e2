//! API Module
//!
//! HTTP handlers and routing that host the cache layer.
//!
//! # Endpoints
//! - `ANY /fetch?url=<absolute url>` - Fetch through the cache
//! - `GET /stats` - Request outcome counters
//! - `GET /generation` - Current generation and lifecycle state
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
