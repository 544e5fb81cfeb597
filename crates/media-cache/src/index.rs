//! The persisted URL-to-file table.
//!
//! One JSON document in the cache directory maps each remote URL to the
//! local file holding its bytes, plus enough metadata to verify the file
//! later. Every mutation rewrites the document through a temp-file rename
//! so a crash never leaves a half-written index.

use crate::error::CacheResult;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::warn;

/// Name of the index document inside the cache directory.
pub(crate) const INDEX_FILE: &str = "index.json";

/// What the index records about one downloaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// File name inside the cache directory.
    pub file: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Hex SHA-256 of the payload.
    pub sha256: String,
    /// Unix seconds when the entry was recorded.
    pub created_at: u64,
}

impl CacheEntry {
    /// Build an entry describing `payload` stored under `file`.
    pub(crate) fn record(file: String, payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Self {
            file,
            size_bytes: payload.len() as u64,
            sha256: hex::encode(hasher.finalize()),
            created_at: now_secs(),
        }
    }

    /// Whether `payload` is byte-for-byte what this entry recorded.
    pub(crate) fn matches(&self, payload: &[u8]) -> bool {
        if payload.len() as u64 != self.size_bytes {
            return false;
        }
        let mut hasher = Sha256::new();
        hasher.update(payload);
        hex::encode(hasher.finalize()) == self.sha256
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// In-memory URL table mirrored to [`INDEX_FILE`].
///
/// Mutating operations hold the write lock across the persist so concurrent
/// inserts cannot overwrite each other with stale snapshots.
pub(crate) struct MediaIndex {
    path: PathBuf,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MediaIndex {
    /// Load the index from `dir`, starting empty when the document is
    /// missing. A document that fails to parse is logged and discarded
    /// rather than treated as fatal.
    pub(crate) async fn load(dir: &Path) -> Self {
        let path = dir.join(INDEX_FILE);
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding unreadable media index");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub(crate) async fn get(&self, url: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(url).cloned()
    }

    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub(crate) async fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .await
            .values()
            .map(|e| e.size_bytes)
            .sum()
    }

    /// All entries at a point in time, for maintenance sweeps.
    pub(crate) async fn snapshot(&self) -> Vec<(String, CacheEntry)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(url, entry)| (url.clone(), entry.clone()))
            .collect()
    }

    /// Insert (or replace) an entry and persist.
    pub(crate) async fn insert(&self, url: String, entry: CacheEntry) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(url, entry);
        self.persist(&entries).await
    }

    /// Remove an entry and persist. Returns the removed entry, if any.
    pub(crate) async fn remove(&self, url: &str) -> CacheResult<Option<CacheEntry>> {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(url);
        if removed.is_some() {
            self.persist(&entries).await?;
        }
        Ok(removed)
    }

    /// Drop every entry and persist the empty table.
    pub(crate) async fn clear(&self) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.persist(&entries).await
    }

    async fn persist(&self, entries: &HashMap<String, CacheEntry>) -> CacheResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
