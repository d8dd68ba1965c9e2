//! Fetch Orchestrator
//!
//! The per-request control path: cache lookup, network fallback, admission
//! and the follow-up cache write.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{Admission, AdmissionFilter, CacheStats, StatsRecorder};
use crate::config::Config;
use crate::fetch::{FetchResponse, Network};
use crate::generation::{Generation, GenerationHandle};
use crate::models::FetchRequest;
use crate::tasks::{spawn_cache_write, write_entry, CacheWrite};

// == Dispatch ==
/// A handled request plus the cache write it may have started.
#[derive(Debug)]
pub struct Dispatch {
    pub response: FetchResponse,
    /// Spawned write-behind task, present only for admitted responses when
    /// write-behind is enabled
    pub pending_write: Option<JoinHandle<()>>,
}

impl Dispatch {
    fn done(response: FetchResponse) -> Self {
        Self {
            response,
            pending_write: None,
        }
    }
}

// == Fetch Orchestrator ==
/// Serves intercepted requests cache-first with network fallback.
///
/// Holds only a [`GenerationHandle`]; the store used for a request is the one
/// current when that request started, even if a new generation is activated
/// while it is in flight.
pub struct FetchOrchestrator {
    generations: GenerationHandle,
    network: Arc<dyn Network>,
    admission: Arc<dyn Admission>,
    max_items: usize,
    write_behind: bool,
    stats: Arc<StatsRecorder>,
}

impl FetchOrchestrator {
    // == Constructor ==
    /// Creates an orchestrator that writes admitted responses inline, before
    /// the response is returned.
    ///
    /// Unlike [`from_config`](Self::from_config), which follows
    /// `Config::write_behind` (on by default), write-behind here is opt-in via
    /// [`with_write_behind`](Self::with_write_behind).
    pub fn new(
        generations: GenerationHandle,
        network: Arc<dyn Network>,
        admission: Arc<dyn Admission>,
        max_items: usize,
    ) -> Self {
        Self {
            generations,
            network,
            admission,
            max_items,
            write_behind: false,
            stats: Arc::new(StatsRecorder::new()),
        }
    }

    /// Creates an orchestrator using the configured origin patterns, capacity
    /// and write mode.
    pub fn from_config(
        config: &Config,
        generations: GenerationHandle,
        network: Arc<dyn Network>,
    ) -> Self {
        let admission = Arc::new(AdmissionFilter::new(config.cacheable_patterns.clone()));
        Self::new(generations, network, admission, config.max_items)
            .with_write_behind(config.write_behind)
    }

    /// Moves cache writes off the response path into spawned tasks.
    pub fn with_write_behind(mut self, enabled: bool) -> Self {
        self.write_behind = enabled;
        self
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    pub fn current_generation(&self) -> Option<Generation> {
        self.generations.current()
    }

    // == Handle ==
    /// Handles a request and returns its response. Never fails: network
    /// errors become [`FetchResponse::NetworkError`] and cache write errors are
    /// only logged.
    pub async fn handle(&self, request: FetchRequest) -> FetchResponse {
        self.dispatch(request).await.response
    }

    // == Dispatch ==
    /// Like [`handle`](Self::handle), but also returns the write-behind task
    /// so callers can wait for the cache to settle.
    pub async fn dispatch(&self, request: FetchRequest) -> Dispatch {
        if !request.is_get() {
            debug!(method = %request.method, url = %request.url, "non-GET request, passing through");
            return Dispatch::done(self.pass_through(&request).await);
        }

        let Some(generation) = self.generations.current() else {
            debug!(url = %request.url, "no active generation, passing through");
            return Dispatch::done(self.pass_through(&request).await);
        };

        let key = request.key();

        if let Some(entry) = generation.store.get(&key).await {
            self.stats.record_hit();
            debug!(generation = %generation.label, key = %key, "cache hit");
            return Dispatch::done(FetchResponse::Cached(entry.payload));
        }
        self.stats.record_miss();

        let payload = match self.network.fetch(&request).await {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.record_network_error();
                warn!(key = %key, error = %e, "network fetch failed with no cached fallback");
                return Dispatch::done(FetchResponse::NetworkError(e.to_string()));
            }
        };

        if !self.admission.is_cacheable(&request, &payload) {
            self.stats.record_rejected();
            debug!(key = %key, status = %payload.status, "response not admitted");
            return Dispatch::done(FetchResponse::Network(payload));
        }

        let write = CacheWrite {
            store: generation.store,
            key,
            payload: payload.clone(),
            max_items: self.max_items,
            stats: self.stats.clone(),
        };

        let pending_write = if self.write_behind {
            Some(spawn_cache_write(write))
        } else {
            write_entry(write).await;
            None
        };

        Dispatch {
            response: FetchResponse::Network(payload),
            pending_write,
        }
    }

    async fn pass_through(&self, request: &FetchRequest) -> FetchResponse {
        self.stats.record_pass_through();

        match self.network.fetch(request).await {
            Ok(payload) => FetchResponse::PassThrough(payload),
            Err(e) => {
                self.stats.record_network_error();
                warn!(method = %request.method, url = %request.url, error = %e, "pass-through fetch failed");
                FetchResponse::NetworkError(e.to_string())
            }
        }
    }
}
