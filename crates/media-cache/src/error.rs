//! Error types for the media cache.

use thiserror::Error;

/// Errors surfaced by cache maintenance and by the background download path.
///
/// Note that [`MediaCache::resolve`](crate::MediaCache::resolve) never
/// returns these; download failures are logged and the caller falls back to
/// the remote URL.
#[derive(Debug, Error)]
pub enum CacheError {
    /// HTTP transport failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status} fetching {url}")]
    UnexpectedStatus {
        /// Status code returned by the server.
        status: u16,
        /// URL that was being fetched.
        url: String,
    },

    /// Filesystem failure reading or writing cached files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The index file could not be serialized or deserialized.
    #[error("index serialization failed: {0}")]
    Index(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
