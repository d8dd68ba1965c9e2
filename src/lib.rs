//! Tile Cache - A request-interception cache layer
//!
//! Serves stored responses cache-first, falls back to the network, admits
//! map tiles and map-library assets into a FIFO-bounded store, and keeps a
//! single live cache generation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod generation;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use fetch::{FetchOrchestrator, FetchResponse, HttpNetwork, Network};
pub use generation::{GenerationManager, GenerationState};
