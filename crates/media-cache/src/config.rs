//! Configuration for the media cache.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Media cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCacheConfig {
    /// Directory where downloaded files and the index live.
    pub cache_dir: PathBuf,

    /// Hard per-download timeout.
    #[serde(with = "humantime_serde")]
    pub download_timeout: Duration,

    /// User-Agent sent with media requests.
    pub user_agent: String,
}

/// Serialize Duration as seconds for readability in config files.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for MediaCacheConfig {
    fn default() -> Self {
        let cache_root = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        Self {
            cache_dir: cache_root.join("letswalk").join("media"),
            download_timeout: Duration::from_secs(30),
            user_agent: concat!("letswalk-media-cache/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl MediaCacheConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LETSWALK_MEDIA_CACHE_DIR`: Cache directory (default: platform cache dir)
    /// - `LETSWALK_MEDIA_TIMEOUT_SECS`: Download timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("LETSWALK_MEDIA_CACHE_DIR") {
            if !dir.is_empty() {
                config.cache_dir = PathBuf::from(dir);
            }
        }

        if let Some(secs) = env::var("LETSWALK_MEDIA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.download_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Builder-style method to set the cache directory
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Builder-style method to set the download timeout
    #[must_use]
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Builder-style method to set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> CacheResult<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(CacheError::config("cache_dir cannot be empty"));
        }
        if self.download_timeout.is_zero() {
            return Err(CacheError::config("download_timeout cannot be zero"));
        }
        if self.user_agent.is_empty() {
            return Err(CacheError::config("user_agent cannot be empty"));
        }
        Ok(())
    }
}
