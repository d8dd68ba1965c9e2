//! Generation Manager
//!
//! Owns the lifecycle of cache generations: creates and precaches the new
//! generation, publishes it as current, and purges every older one.
//!
//! # Lifecycle
//! `Uninitialized -> Activating -> Active`. A strict-mode precache failure,
//! or dropping the `activate` future part way, returns the manager to
//! `Uninitialized`.

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cache::{evict_if_needed, CacheStorage, Store};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::fetch::Network;
use crate::models::{FetchRequest, RequestKey};

// == Generation State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Uninitialized,
    Activating,
    Active,
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationState::Uninitialized => "uninitialized",
            GenerationState::Activating => "activating",
            GenerationState::Active => "active",
        };
        f.write_str(name)
    }
}

// == Generation ==
/// A cache namespace: a label and the store holding its entries.
#[derive(Debug, Clone)]
pub struct Generation {
    pub label: String,
    pub store: Arc<Store>,
}

// == Generation Handle ==
/// Read side of the current-generation cell.
///
/// Cloned into every component that serves requests; each call to
/// [`current`](Self::current) is an atomic snapshot.
#[derive(Debug, Clone)]
pub struct GenerationHandle {
    rx: watch::Receiver<Option<Generation>>,
}

impl GenerationHandle {
    /// The current generation, or `None` until activation completes.
    pub fn current(&self) -> Option<Generation> {
        self.rx.borrow().clone()
    }
}

// == Activation Report ==
/// A precache URL that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

/// Summary of a completed activation.
#[derive(Debug, Clone)]
pub struct ActivationReport {
    /// Label of the generation that became current
    pub label: String,
    /// Precache URLs stored successfully
    pub precached: usize,
    /// Precache URLs skipped in lenient mode
    pub failures: Vec<PrecacheFailure>,
    /// Entries evicted because the precache list exceeded capacity
    pub evicted: usize,
    /// Older generations destroyed
    pub purged: Vec<String>,
}

// == Generation Manager ==
/// Single writer of the current-generation cell.
#[derive(Debug)]
pub struct GenerationManager {
    label: String,
    storage: Arc<CacheStorage>,
    precache_urls: Vec<String>,
    origin: String,
    max_items: usize,
    strict_precache: bool,
    state: watch::Sender<GenerationState>,
    current: watch::Sender<Option<Generation>>,
}

/// Puts the state back to `Uninitialized` unless the activation completes.
struct ActivationGuard<'a> {
    state: &'a watch::Sender<GenerationState>,
    completed: bool,
}

impl ActivationGuard<'_> {
    fn complete(mut self) {
        self.completed = true;
        self.state.send_replace(GenerationState::Active);
    }
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.state.send_replace(GenerationState::Uninitialized);
        }
    }
}

impl GenerationManager {
    // == Constructor ==
    /// Creates a manager for the generation labelled by `config`, backed by
    /// `storage`. Nothing is opened until [`activate`](Self::activate).
    pub fn new(storage: Arc<CacheStorage>, config: &Config) -> Self {
        let (current, _) = watch::channel(None);
        let (state, _) = watch::channel(GenerationState::Uninitialized);

        Self {
            label: config.generation_label(),
            storage,
            precache_urls: config.precache_urls.clone(),
            origin: config.origin.clone(),
            max_items: config.max_items,
            strict_precache: config.strict_precache,
            state,
            current,
        }
    }

    /// Label of the generation this manager activates.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> GenerationState {
        *self.state.borrow()
    }

    /// The current generation, or `None` until activation completes.
    pub fn current(&self) -> Option<Generation> {
        self.current.borrow().clone()
    }

    /// Returns a read handle for request-serving components.
    pub fn subscribe(&self) -> GenerationHandle {
        GenerationHandle {
            rx: self.current.subscribe(),
        }
    }

    // == Activate ==
    /// Creates and precaches this manager's generation, makes it current and
    /// purges every other generation in storage.
    ///
    /// In lenient mode failing precache URLs are reported and skipped. In
    /// strict mode the first failure deletes the partially filled store and
    /// returns [`CacheError::Precache`]; older generations are left untouched.
    pub async fn activate(&self, network: &dyn Network) -> Result<ActivationReport> {
        let mut found = GenerationState::Uninitialized;
        let claimed = self.state.send_if_modified(|state| {
            found = *state;
            if *state == GenerationState::Uninitialized {
                *state = GenerationState::Activating;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(CacheError::InvalidState(format!(
                "generation '{}' is already {}",
                self.label, found
            )));
        }
        let guard = ActivationGuard {
            state: &self.state,
            completed: false,
        };
        info!(generation = %self.label, "activating cache generation");

        // A pinned label may name a store that is already serving
        let (store, created) = self.storage.open(&self.label).await?;
        let mut report = ActivationReport {
            label: self.label.clone(),
            precached: 0,
            failures: Vec::new(),
            evicted: 0,
            purged: Vec::new(),
        };
        let mut added: Vec<RequestKey> = Vec::new();

        for url in &self.precache_urls {
            match self.precache(&store, url, network).await {
                Ok(Some(key)) => {
                    report.precached += 1;
                    added.push(key);
                }
                Ok(None) => report.precached += 1,
                Err(reason) if self.strict_precache => {
                    warn!(generation = %self.label, url = %url, reason = %reason, "precache failed, aborting activation");
                    if created {
                        self.storage.delete(&self.label).await;
                    } else {
                        for key in &added {
                            store.delete(key).await;
                        }
                    }
                    return Err(CacheError::Precache {
                        url: url.clone(),
                        reason,
                    });
                }
                Err(reason) => {
                    warn!(generation = %self.label, url = %url, reason = %reason, "precache failed, skipping");
                    report.failures.push(PrecacheFailure {
                        url: url.clone(),
                        reason,
                    });
                }
            }
        }

        report.evicted = evict_if_needed(&store, self.max_items).await;

        self.current.send_replace(Some(Generation {
            label: self.label.clone(),
            store,
        }));
        guard.complete();

        for name in self.storage.names().await {
            if name != self.label && self.storage.delete(&name).await {
                report.purged.push(name);
            }
        }

        info!(
            generation = %self.label,
            precached = report.precached,
            failed = report.failures.len(),
            purged = report.purged.len(),
            "cache generation active"
        );

        Ok(report)
    }

    /// Fetches and stores one precache URL. Returns the key when it was not
    /// in the store before.
    async fn precache(
        &self,
        store: &Store,
        url: &str,
        network: &dyn Network,
    ) -> std::result::Result<Option<RequestKey>, String> {
        let resolved = self.resolve(url)?;
        let request = FetchRequest::get(&resolved).map_err(|e| e.to_string())?;
        let payload = network.fetch(&request).await.map_err(|e| e.to_string())?;

        if !payload.status.is_success() {
            return Err(format!("unexpected status {}", payload.status));
        }

        let key = request.key();
        let is_new = store.get(&key).await.is_none();
        store
            .put(key.clone(), payload)
            .await
            .map_err(|e| e.to_string())?;

        Ok(is_new.then_some(key))
    }

    /// Resolves relative precache entries against the configured origin.
    fn resolve(&self, url: &str) -> std::result::Result<String, String> {
        Url::parse(url)
            .or_else(|_| Url::parse(&self.origin).and_then(|base| base.join(url)))
            .map(String::from)
            .map_err(|e| format!("cannot resolve '{}' against '{}': {}", url, self.origin, e))
    }
}
