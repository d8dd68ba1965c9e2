//! Cache Storage Module
//!
//! Generation-level registry of named stores, kept in memory or under a
//! cache directory with one subdirectory per generation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{EntryDir, Store};
use crate::error::StoreError;

// == Cache Storage ==
/// Named collection of stores, one per cache generation.
///
/// Stores are handed out as `Arc`s; deleting a store drops the registry's
/// reference, retires it and clears it, while any in-flight holder keeps a
/// valid (if empty) store until it lets go.
#[derive(Debug, Default)]
pub struct CacheStorage {
    root: Option<PathBuf>,
    stores: RwLock<BTreeMap<String, Arc<Store>>>,
}

impl CacheStorage {
    /// Creates an empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens persistent storage under `root`, restoring every generation
    /// directory found there.
    pub async fn on_disk(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::Io(format!("failed to create {}: {}", root.display(), e)))?;

        let mut listing = fs::read_dir(&root)
            .await
            .map_err(|e| StoreError::Io(format!("failed to read {}: {}", root.display(), e)))?;

        let mut stores = BTreeMap::new();
        while let Some(item) = listing
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(format!("failed to read {}: {}", root.display(), e)))?
        {
            let path = item.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };

            let store = Store::open_dir(name.clone(), EntryDir::create(path).await?).await?;
            stores.insert(name, Arc::new(store));
        }

        info!(root = %root.display(), generations = stores.len(), "cache storage opened");
        Ok(Self {
            root: Some(root),
            stores: RwLock::new(stores),
        })
    }

    /// Directory the stores live in, `None` for in-memory storage.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    // == Open ==
    /// Returns the store named `name`, creating it if absent. The flag is
    /// `true` when this call created the store.
    pub async fn open(&self, name: &str) -> Result<(Arc<Store>, bool), StoreError> {
        validate_name(name)?;

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(name) {
            return Ok((store.clone(), false));
        }

        let store = match &self.root {
            Some(root) => Store::open_dir(name, EntryDir::create(root.join(name)).await?).await?,
            None => Store::new(name),
        };
        let store = Arc::new(store);
        stores.insert(name.to_string(), store.clone());
        debug!(store = %name, "store created");

        Ok((store, true))
    }

    /// Returns the store named `name` without creating it.
    pub async fn get(&self, name: &str) -> Option<Arc<Store>> {
        self.stores.read().await.get(name).cloned()
    }

    // == Names ==
    /// Enumerates the names of all stores.
    pub async fn names(&self) -> Vec<String> {
        self.stores.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.stores.read().await.contains_key(name)
    }

    // == Delete ==
    /// Destroys the store named `name`, including its directory. Returns
    /// whether it existed.
    pub async fn delete(&self, name: &str) -> bool {
        let removed = self.stores.write().await.remove(name);

        match removed {
            Some(store) => {
                let cleared = store.destroy().await;
                info!(store = %name, cleared, "store deleted");
                true
            }
            None => false,
        }
    }
}

/// Store names double as directory names.
fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
