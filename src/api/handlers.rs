//! API Handlers
//!
//! HTTP request handlers for the fetch proxy and informational endpoints.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, Method},
    Json,
};

use crate::error::{CacheError, Result};
use crate::fetch::{FetchOrchestrator, FetchResponse};
use crate::generation::GenerationManager;
use crate::models::{FetchQuery, FetchRequest, GenerationResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Request path: cache lookup and network fallback
    pub orchestrator: Arc<FetchOrchestrator>,
    /// Generation lifecycle, for introspection
    pub generations: Arc<GenerationManager>,
}

impl AppState {
    /// Creates a new AppState from an orchestrator and the manager whose
    /// generations it serves.
    pub fn new(orchestrator: FetchOrchestrator, generations: Arc<GenerationManager>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            generations,
        }
    }
}

/// Handler for ANY /fetch?url=...
///
/// Runs the request through the orchestrator. Request bodies are not
/// forwarded.
pub async fn fetch_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<FetchQuery>,
) -> Result<FetchResponse> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    // These describe the hop to this proxy, not the origin request
    let mut forwarded = headers;
    for name in [
        header::HOST,
        header::CONTENT_LENGTH,
        header::CONNECTION,
        header::TRANSFER_ENCODING,
    ] {
        forwarded.remove(name);
    }

    let request = FetchRequest::new(method, &query.url)?.with_headers(forwarded);

    Ok(state.orchestrator.handle(request).await)
}

/// Handler for GET /stats
///
/// Returns request outcome counters and the current store size.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let total_entries = match state.orchestrator.current_generation() {
        Some(generation) => generation.store.len().await,
        None => 0,
    };

    Json(StatsResponse::new(state.orchestrator.stats(), total_entries))
}

/// Handler for GET /generation
///
/// Returns the current generation's label, lifecycle state and size.
pub async fn generation_handler(State(state): State<AppState>) -> Json<GenerationResponse> {
    let current = state.generations.current();
    let entries = match &current {
        Some(generation) => generation.store.len().await,
        None => 0,
    };

    Json(GenerationResponse {
        label: current.map(|generation| generation.label),
        state: state.generations.state(),
        entries,
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
