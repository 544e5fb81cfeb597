//! Fetching remote media bytes.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches a remote object as raw bytes.
///
/// The cache ships [`HttpFetcher`]; tests inject in-memory fakes.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Fetch the full object at `url`.
    async fn fetch(&self, url: &str) -> CacheResult<Vec<u8>>;
}

/// `reqwest`-backed fetcher with a hard per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given request timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: &str) -> CacheResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ObjectFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> CacheResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        debug!(url = %url, size = bytes.len(), "fetched remote media");
        Ok(bytes.to_vec())
    }
}
