//! On-disk Entry Directory
//!
//! Persists one generation's entries as files so a restart finds the store
//! as it was left.
//!
//! # Layout
//!
//! ```text
//! {cache_dir}/{generation}/
//!   00000000000000000007.body   # response body
//!   00000000000000000007.json   # key, status, headers, stored_at
//! ```
//!
//! File stems are insertion ranks, so a sorted listing is insertion order.
//! The metadata file is written last and marks an entry complete; a body
//! without metadata is ignored on load.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::error::StoreError;
use crate::models::{RequestKey, ResponsePayload};

const META_EXT: &str = "json";
const BODY_EXT: &str = "body";

/// Everything about an entry except its body.
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    method: String,
    url: String,
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

// == Entry Directory ==
/// Directory holding the files of a single store.
#[derive(Debug, Clone)]
pub struct EntryDir {
    path: PathBuf,
}

impl EntryDir {
    /// Opens the directory at `path`, creating it if needed.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        fs::create_dir_all(&path)
            .await
            .map_err(|e| io_error("failed to create entry directory", &path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self, rank: u64, ext: &str) -> PathBuf {
        self.path.join(format!("{:020}.{}", rank, ext))
    }

    // == Write ==
    /// Writes an entry: body first, then the metadata that completes it.
    pub async fn write(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        let meta = EntryMeta {
            method: entry.key.method.to_string(),
            url: entry.key.url.clone(),
            status: entry.payload.status.as_u16(),
            // Non-UTF-8 header values are dropped
            headers: entry
                .payload
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.to_string(), v.to_string()))
                })
                .collect(),
            stored_at: entry.stored_at,
        };
        let meta_json = serde_json::to_vec(&meta)
            .map_err(|e| StoreError::Io(format!("failed to serialize entry metadata: {}", e)))?;

        write_atomic(&self.file(entry.rank, BODY_EXT), &entry.payload.body).await?;
        write_atomic(&self.file(entry.rank, META_EXT), &meta_json).await
    }

    // == Remove ==
    /// Removes the files of the entry with `rank`. Missing files are ignored.
    pub async fn remove(&self, rank: u64) {
        // Metadata first, so a half-removed entry is never loaded
        for ext in [META_EXT, BODY_EXT] {
            let path = self.file(rank, ext);
            if let Err(e) = fs::remove_file(&path).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove entry file");
                }
            }
        }
    }

    // == Load ==
    /// Reads every complete entry, lowest rank first. Unreadable entries are
    /// logged and skipped.
    pub async fn load(&self) -> Result<Vec<CacheEntry>, StoreError> {
        let mut listing = fs::read_dir(&self.path)
            .await
            .map_err(|e| io_error("failed to read entry directory", &self.path, e))?;

        let mut ranks = Vec::new();
        while let Some(item) = listing
            .next_entry()
            .await
            .map_err(|e| io_error("failed to read entry directory", &self.path, e))?
        {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(META_EXT) {
                continue;
            }
            if let Some(rank) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u64>().ok())
            {
                ranks.push(rank);
            }
        }
        ranks.sort_unstable();

        let mut entries = Vec::with_capacity(ranks.len());
        for rank in ranks {
            match self.read(rank).await {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(dir = %self.path.display(), rank, error = %e, "skipping unreadable entry")
                }
            }
        }

        debug!(dir = %self.path.display(), entries = entries.len(), "entries loaded");
        Ok(entries)
    }

    async fn read(&self, rank: u64) -> Result<CacheEntry, StoreError> {
        let meta_path = self.file(rank, META_EXT);
        let raw = fs::read(&meta_path)
            .await
            .map_err(|e| io_error("failed to read entry metadata", &meta_path, e))?;
        let meta: EntryMeta = serde_json::from_slice(&raw).map_err(|e| {
            StoreError::Io(format!("corrupt metadata {}: {}", meta_path.display(), e))
        })?;

        let body_path = self.file(rank, BODY_EXT);
        let body = fs::read(&body_path)
            .await
            .map_err(|e| io_error("failed to read entry body", &body_path, e))?;

        let method = Method::from_bytes(meta.method.as_bytes())
            .map_err(|e| StoreError::Io(format!("invalid method '{}': {}", meta.method, e)))?;
        let status = StatusCode::from_u16(meta.status)
            .map_err(|e| StoreError::Io(format!("invalid status {}: {}", meta.status, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in meta.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                headers.append(name, value);
            }
        }

        Ok(CacheEntry {
            key: RequestKey {
                method,
                url: meta.url,
            },
            payload: ResponsePayload {
                status,
                headers,
                body: Bytes::from(body),
            },
            rank,
            stored_at: meta.stored_at,
        })
    }

    // == Destroy ==
    /// Deletes the directory and everything in it.
    pub async fn destroy(&self) {
        if let Err(e) = fs::remove_dir_all(&self.path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(dir = %self.path.display(), error = %e, "failed to remove entry directory");
            }
        }
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let mut temp: OsString = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp_path = PathBuf::from(temp);

    fs::write(&temp_path, content)
        .await
        .map_err(|e| io_error("failed to write temp file", &temp_path, e))?;
    fs::rename(&temp_path, path)
        .await
        .map_err(|e| io_error("failed to rename temp file", path, e))?;

    Ok(())
}

fn io_error(context: &str, path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{} {}: {}", context, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchRequest;
    use axum::http::header;
    use tempfile::TempDir;

    fn entry(n: u64, rank: u64) -> CacheEntry {
        let key = FetchRequest::get(&format!("https://tile.openstreetmap.org/9/{}/3.png", n))
            .unwrap()
            .key();
        let payload = ResponsePayload::new(StatusCode::OK)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))
            .with_body(format!("tile-{}", n));
        CacheEntry::new(key, payload, rank)
    }

    #[tokio::test]
    async fn test_written_entries_load_in_rank_order() {
        let temp_dir = TempDir::new().unwrap();
        let dir = EntryDir::create(temp_dir.path().join("map-cache-v1")).await.unwrap();

        // Written out of order on purpose
        dir.write(&entry(2, 11)).await.unwrap();
        dir.write(&entry(1, 3)).await.unwrap();

        let loaded = dir.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].rank, 3);
        assert_eq!(loaded[0].key, entry(1, 3).key);
        assert_eq!(&loaded[0].payload.body[..], b"tile-1");
        assert_eq!(
            loaded[0].payload.headers.get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        assert_eq!(loaded[1].rank, 11);
    }

    #[tokio::test]
    async fn test_body_without_metadata_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let dir = EntryDir::create(temp_dir.path()).await.unwrap();

        dir.write(&entry(1, 0)).await.unwrap();
        fs::write(dir.file(1, BODY_EXT), b"orphan").await.unwrap();
        fs::write(dir.path().join("notes.txt"), b"stray").await.unwrap();

        let loaded = dir.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].rank, 0);
    }

    #[tokio::test]
    async fn test_corrupt_metadata_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dir = EntryDir::create(temp_dir.path()).await.unwrap();

        dir.write(&entry(1, 0)).await.unwrap();
        dir.write(&entry(2, 1)).await.unwrap();
        fs::write(dir.file(1, META_EXT), b"{not json").await.unwrap();

        let loaded = dir.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].rank, 0);
    }

    #[tokio::test]
    async fn test_remove_and_destroy() {
        let temp_dir = TempDir::new().unwrap();
        let dir = EntryDir::create(temp_dir.path().join("gen")).await.unwrap();

        dir.write(&entry(1, 0)).await.unwrap();
        dir.remove(0).await;
        dir.remove(0).await;
        assert!(dir.load().await.unwrap().is_empty());

        dir.destroy().await;
        assert!(!dir.path().exists());
        dir.destroy().await;
    }
}
