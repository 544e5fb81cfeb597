//! The media cache: remote URL in, renderable source out.

use crate::config::MediaCacheConfig;
use crate::error::CacheResult;
use crate::fetcher::{HttpFetcher, ObjectFetcher};
use crate::index::{CacheEntry, MediaIndex, INDEX_FILE};
use crate::inflight::{self, Claim, InFlight, Ticket};
use crate::sniff;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// What [`MediaCache::resolve`] hands the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A local file the renderer can open directly.
    Local(PathBuf),
    /// The original remote URL; the cache is filling in the background.
    Remote(String),
    /// Nothing to render (the URL was empty).
    None,
}

impl MediaSource {
    /// URI form for renderers that take plain strings.
    pub fn uri(&self) -> Option<String> {
        match self {
            MediaSource::Local(path) => Some(path.display().to_string()),
            MediaSource::Remote(url) => Some(url.clone()),
            MediaSource::None => None,
        }
    }

    /// True when the source is a cached local file.
    pub fn is_local(&self) -> bool {
        matches!(self, MediaSource::Local(_))
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of URLs with a recorded local file.
    pub entries: usize,
    /// Total recorded payload bytes.
    pub total_bytes: u64,
    /// Directory the cache lives in.
    pub cache_dir: PathBuf,
}

struct CacheInner {
    config: MediaCacheConfig,
    index: MediaIndex,
    in_flight: InFlight,
    fetcher: Arc<dyn ObjectFetcher>,
}

/// URL-keyed local cache for walk photos and avatars.
///
/// Cheap to clone; clones share one index, one in-flight table and one
/// fetcher. [`resolve`](Self::resolve) never fails: the worst outcome is
/// rendering straight from the remote URL while a background download
/// fills the cache.
#[derive(Clone)]
pub struct MediaCache {
    inner: Arc<CacheInner>,
}

impl MediaCache {
    /// Open the cache with an HTTP fetcher built from `config`.
    pub async fn open(config: MediaCacheConfig) -> CacheResult<Self> {
        let fetcher = Arc::new(HttpFetcher::new(
            config.download_timeout,
            &config.user_agent,
        )?);
        Self::with_fetcher(config, fetcher).await
    }

    /// Open the cache over a caller-supplied fetcher.
    pub async fn with_fetcher(
        config: MediaCacheConfig,
        fetcher: Arc<dyn ObjectFetcher>,
    ) -> CacheResult<Self> {
        config.validate()?;
        tokio::fs::create_dir_all(&config.cache_dir).await?;
        let index = MediaIndex::load(&config.cache_dir).await;
        Ok(Self {
            inner: Arc::new(CacheInner {
                config,
                index,
                in_flight: InFlight::new(),
                fetcher,
            }),
        })
    }

    /// The configuration this cache was opened with.
    pub fn config(&self) -> &MediaCacheConfig {
        &self.inner.config
    }

    /// Resolve `url` to something renderable without waiting on the network.
    ///
    /// - Empty URL: [`MediaSource::None`], no I/O at all.
    /// - Cached and the file exists: [`MediaSource::Local`].
    /// - Cached but the file vanished: drop the stale entry, start a
    ///   background re-download, return [`MediaSource::Remote`].
    /// - Not cached: start a background download, return
    ///   [`MediaSource::Remote`].
    ///
    /// Concurrent calls for one URL share a single download.
    #[instrument(skip(self))]
    pub async fn resolve(&self, url: &str) -> MediaSource {
        if url.is_empty() {
            return MediaSource::None;
        }

        if let Some(path) = self.cached_path(url).await {
            return MediaSource::Local(path);
        }

        self.spawn_download(url);
        MediaSource::Remote(url.to_string())
    }

    /// Resolve `url`, waiting for the download when one is needed or already
    /// in flight. Returns the local source on success and the remote
    /// fallback when the download failed.
    #[instrument(skip(self))]
    pub async fn prewarm(&self, url: &str) -> MediaSource {
        if url.is_empty() {
            return MediaSource::None;
        }

        if let Some(path) = self.cached_path(url).await {
            return MediaSource::Local(path);
        }

        match self.inner.in_flight.claim(url) {
            Claim::Claimed(ticket) => download_into_cache(&self.inner, url, ticket).await,
            Claim::Joined(rx) => inflight::wait(rx).await,
        }

        match self.cached_path(url).await {
            Some(path) => MediaSource::Local(path),
            None => MediaSource::Remote(url.to_string()),
        }
    }

    /// Current entry count and recorded size.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.index.len().await,
            total_bytes: self.inner.index.total_bytes().await,
            cache_dir: self.inner.config.cache_dir.clone(),
        }
    }

    /// Drop index entries whose file is gone and delete files the index no
    /// longer references. Returns the number of stale entries dropped.
    ///
    /// Intended for idle-time maintenance; a download racing the sweep may
    /// have its file re-fetched on the next resolve.
    pub async fn prune(&self) -> CacheResult<usize> {
        let mut removed = 0;
        for (url, entry) in self.inner.index.snapshot().await {
            let path = self.inner.config.cache_dir.join(&entry.file);
            if !file_exists(&path).await && self.inner.index.remove(&url).await?.is_some() {
                debug!(url = %url, file = %entry.file, "pruned stale index entry");
                removed += 1;
            }
        }

        let referenced: HashSet<String> = self
            .inner
            .index
            .snapshot()
            .await
            .into_iter()
            .map(|(_, entry)| entry.file)
            .collect();

        let mut dir = tokio::fs::read_dir(&self.inner.config.cache_dir).await?;
        while let Some(dirent) = dir.next_entry().await? {
            let name = dirent.file_name().to_string_lossy().into_owned();
            if name.starts_with(INDEX_FILE) || referenced.contains(&name) {
                continue;
            }
            debug!(file = %name, "removing orphaned cache file");
            let _ = tokio::fs::remove_file(dirent.path()).await;
        }

        Ok(removed)
    }

    /// Re-hash every cached file and evict entries whose bytes no longer
    /// match what was recorded. Returns the number of evicted entries.
    pub async fn verify(&self) -> CacheResult<usize> {
        let mut evicted = 0;
        for (url, entry) in self.inner.index.snapshot().await {
            let path = self.inner.config.cache_dir.join(&entry.file);
            let intact = match tokio::fs::read(&path).await {
                Ok(bytes) => entry.matches(&bytes),
                Err(_) => false,
            };
            if intact {
                continue;
            }
            warn!(url = %url, file = %entry.file, "cached media failed verification, evicting");
            self.inner.index.remove(&url).await?;
            let _ = tokio::fs::remove_file(&path).await;
            evicted += 1;
        }
        Ok(evicted)
    }

    /// Remove every cached file and empty the index.
    pub async fn clear(&self) -> CacheResult<()> {
        self.inner.index.clear().await?;
        let mut dir = tokio::fs::read_dir(&self.inner.config.cache_dir).await?;
        while let Some(dirent) = dir.next_entry().await? {
            let name = dirent.file_name().to_string_lossy().into_owned();
            if name.starts_with(INDEX_FILE) {
                continue;
            }
            let _ = tokio::fs::remove_file(dirent.path()).await;
        }
        Ok(())
    }

    /// Local path for `url` if the index knows it and the file is present.
    /// A recorded file that vanished out-of-band drops its stale entry here
    /// so the next download can heal the cache.
    async fn cached_path(&self, url: &str) -> Option<PathBuf> {
        let entry = self.inner.index.get(url).await?;
        let path = self.inner.config.cache_dir.join(&entry.file);
        if file_exists(&path).await {
            return Some(path);
        }

        warn!(url = %url, file = %entry.file, "cached media file missing, dropping stale entry");
        if let Err(e) = self.inner.index.remove(url).await {
            warn!(url = %url, error = %e, "failed to drop stale index entry");
        }
        None
    }

    /// Kick off a background download unless one is already in flight.
    fn spawn_download(&self, url: &str) {
        match self.inner.in_flight.claim(url) {
            Claim::Claimed(ticket) => {
                let inner = Arc::clone(&self.inner);
                let url = url.to_string();
                tokio::spawn(async move {
                    download_into_cache(&inner, &url, ticket).await;
                });
            }
            Claim::Joined(_) => {
                debug!(url = %url, "download already in flight");
            }
        }
    }
}

/// Run one claimed download to completion. The ticket is released when this
/// returns, waking anyone who joined the flight.
async fn download_into_cache(inner: &CacheInner, url: &str, ticket: Ticket) {
    let _ticket = ticket;
    match fetch_and_store(inner, url).await {
        Ok(path) => debug!(url = %url, path = %path.display(), "media cached"),
        Err(e) => warn!(url = %url, error = %e, "media download failed, keeping remote fallback"),
    }
}

async fn fetch_and_store(inner: &CacheInner, url: &str) -> CacheResult<PathBuf> {
    let payload = inner.fetcher.fetch(url).await?;
    let extension = sniff::extension_for(&payload, url);
    let file = format!("{}.{}", Uuid::new_v4(), extension);
    let path = inner.config.cache_dir.join(&file);

    if let Err(e) = tokio::fs::write(&path, &payload).await {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(e.into());
    }

    inner
        .index
        .insert(url.to_string(), CacheEntry::record(file, &payload))
        .await?;
    Ok(path)
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

    struct StaticFetcher {
        payload: Vec<u8>,
        hits: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(payload: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                payload: payload.to_vec(),
                hits: AtomicUsize::new(0),
            })
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> CacheResult<Vec<u8>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    struct SlowFetcher {
        payload: Vec<u8>,
        delay: Duration,
        hits: AtomicUsize,
    }

    impl SlowFetcher {
        fn new(payload: &[u8], delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                payload: payload.to_vec(),
                delay,
                hits: AtomicUsize::new(0),
            })
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectFetcher for SlowFetcher {
        async fn fetch(&self, _url: &str) -> CacheResult<Vec<u8>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.payload.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl ObjectFetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> CacheResult<Vec<u8>> {
            Err(CacheError::UnexpectedStatus {
                status: 503,
                url: url.to_string(),
            })
        }
    }

    async fn open_cache(dir: &TempDir, fetcher: Arc<dyn ObjectFetcher>) -> MediaCache {
        let config = MediaCacheConfig::default()
            .with_cache_dir(dir.path())
            .with_download_timeout(Duration::from_secs(5));
        MediaCache::with_fetcher(config, fetcher).await.unwrap()
    }

    async fn wait_for_local(cache: &MediaCache, url: &str) -> PathBuf {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let MediaSource::Local(path) = cache.resolve(url).await {
                    return path;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("download should complete")
    }

    #[test]
    fn test_media_source_uri() {
        assert_eq!(MediaSource::None.uri(), None);
        assert!(!MediaSource::None.is_local());

        let remote = MediaSource::Remote("https://cdn.letswalk.app/w.jpg".to_string());
        assert_eq!(remote.uri().as_deref(), Some("https://cdn.letswalk.app/w.jpg"));
        assert!(!remote.is_local());

        let local = MediaSource::Local(PathBuf::from("/tmp/media/w.jpg"));
        assert_eq!(local.uri().as_deref(), Some("/tmp/media/w.jpg"));
        assert!(local.is_local());
    }

    #[tokio::test]
    async fn test_empty_url_is_none() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::new(JPEG);
        let cache = open_cache(&dir, fetcher.clone()).await;

        assert_eq!(cache.resolve("").await, MediaSource::None);
        assert_eq!(cache.prewarm("").await, MediaSource::None);
        assert_eq!(fetcher.hits(), 0);
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_uncached_resolves_remote_then_local() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::new(JPEG);
        let cache = open_cache(&dir, fetcher.clone()).await;
        let url = "https://cdn.letswalk.app/walks/w1.jpg";

        assert_eq!(cache.resolve(url).await, MediaSource::Remote(url.to_string()));

        let local = wait_for_local(&cache, url).await;
        assert!(local.exists());
        assert_eq!(std::fs::read(&local).unwrap(), JPEG);
        assert_eq!(fetcher.hits(), 1);
    }

    #[tokio::test]
    async fn test_prewarm_downloads_and_caches() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::new(JPEG);
        let cache = open_cache(&dir, fetcher.clone()).await;
        let url = "https://cdn.letswalk.app/walks/w1.bin";

        let MediaSource::Local(path) = cache.prewarm(url).await else {
            panic!("prewarm should cache the file");
        };
        assert!(path.exists());
        // Extension comes from the payload's magic bytes, not the URL.
        assert!(path.extension().is_some_and(|e| e == "jpg"));
        assert_eq!(fetcher.hits(), 1);

        assert_eq!(cache.prewarm(url).await, MediaSource::Local(path.clone()));
        assert_eq!(cache.resolve(url).await, MediaSource::Local(path));
        assert_eq!(fetcher.hits(), 1);
    }

    #[tokio::test]
    async fn test_deleted_file_heals() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::new(JPEG);
        let cache = open_cache(&dir, fetcher.clone()).await;
        let url = "https://cdn.letswalk.app/avatars/u9.jpg";

        let MediaSource::Local(path) = cache.prewarm(url).await else {
            panic!("prewarm should cache the file");
        };
        std::fs::remove_file(&path).unwrap();

        // The stale entry falls back to remote and re-downloads in the
        // background.
        assert_eq!(cache.resolve(url).await, MediaSource::Remote(url.to_string()));
        let healed = wait_for_local(&cache, url).await;
        assert!(healed.exists());
        assert_ne!(healed, path);
        assert_eq!(fetcher.hits(), 2);
    }

    #[tokio::test]
    async fn test_failed_download_falls_back_to_remote() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir, Arc::new(FailingFetcher)).await;
        let url = "https://cdn.letswalk.app/walks/w1.jpg";

        assert_eq!(cache.prewarm(url).await, MediaSource::Remote(url.to_string()));
        assert_eq!(cache.resolve(url).await, MediaSource::Remote(url.to_string()));
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_concurrent_prewarms_share_one_download() {
        let dir = TempDir::new().unwrap();
        let fetcher = SlowFetcher::new(JPEG, Duration::from_millis(50));
        let cache = open_cache(&dir, fetcher.clone()).await;
        let url = "https://cdn.letswalk.app/walks/w1.jpg";

        let (a, b) = tokio::join!(cache.prewarm(url), cache.prewarm(url));
        assert!(a.is_local());
        assert!(b.is_local());
        assert_eq!(a, b);
        assert_eq!(fetcher.hits(), 1);
    }

    #[tokio::test]
    async fn test_repeated_resolves_share_one_download() {
        let dir = TempDir::new().unwrap();
        let fetcher = SlowFetcher::new(JPEG, Duration::from_millis(50));
        let cache = open_cache(&dir, fetcher.clone()).await;
        let url = "https://cdn.letswalk.app/walks/w1.jpg";

        for _ in 0..5 {
            assert!(matches!(cache.resolve(url).await, MediaSource::Remote(_)));
        }
        wait_for_local(&cache, url).await;
        assert_eq!(fetcher.hits(), 1);
    }

    #[tokio::test]
    async fn test_cache_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let url = "https://cdn.letswalk.app/walks/w1.jpg";

        {
            let cache = open_cache(&dir, StaticFetcher::new(JPEG)).await;
            assert!(cache.prewarm(url).await.is_local());
        }

        let fetcher = StaticFetcher::new(JPEG);
        let cache = open_cache(&dir, fetcher.clone()).await;
        assert!(cache.resolve(url).await.is_local());
        assert_eq!(fetcher.hits(), 0);
    }

    #[tokio::test]
    async fn test_stats_and_prune() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::new(JPEG);
        let cache = open_cache(&dir, fetcher.clone()).await;

        let MediaSource::Local(a) = cache.prewarm("https://cdn.letswalk.app/a.jpg").await else {
            panic!("prewarm should cache the file");
        };
        let MediaSource::Local(b) = cache.prewarm("https://cdn.letswalk.app/b.jpg").await else {
            panic!("prewarm should cache the file");
        };

        let stats = cache.stats().await;
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.total_bytes, (JPEG.len() * 2) as u64);
        assert_eq!(stats.cache_dir, dir.path());

        std::fs::remove_file(&a).unwrap();
        let stray = dir.path().join("stray.bin");
        std::fs::write(&stray, b"junk").unwrap();

        let removed = cache.prune().await.unwrap();
        assert_eq!(removed, 1);
        assert!(!stray.exists());
        assert!(b.exists());
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_verify_evicts_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher::new(JPEG);
        let cache = open_cache(&dir, fetcher.clone()).await;
        let url = "https://cdn.letswalk.app/walks/w1.jpg";

        let MediaSource::Local(path) = cache.prewarm(url).await else {
            panic!("prewarm should cache the file");
        };
        std::fs::write(&path, b"scribbled over").unwrap();

        assert_eq!(cache.verify().await.unwrap(), 1);
        assert!(!path.exists());
        assert_eq!(cache.stats().await.entries, 0);
        assert!(matches!(cache.resolve(url).await, MediaSource::Remote(_)));
    }

    #[tokio::test]
    async fn test_verify_keeps_intact_files() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir, StaticFetcher::new(JPEG)).await;
        let url = "https://cdn.letswalk.app/walks/w1.jpg";

        assert!(cache.prewarm(url).await.is_local());
        assert_eq!(cache.verify().await.unwrap(), 0);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_clear_empties_directory_and_index() {
        let dir = TempDir::new().unwrap();
        let cache = open_cache(&dir, StaticFetcher::new(JPEG)).await;

        assert!(cache.prewarm("https://cdn.letswalk.app/a.jpg").await.is_local());
        assert!(cache.prewarm("https://cdn.letswalk.app/b.jpg").await.is_local());

        cache.clear().await.unwrap();
        assert_eq!(cache.stats().await.entries, 0);

        // Only the index document survives.
        let remaining: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(remaining.len(), 1);

        assert!(matches!(
            cache.resolve("https://cdn.letswalk.app/a.jpg").await,
            MediaSource::Remote(_)
        ));
    }
}
