//! Local cache for remote walk photos and avatars.
//!
//! Screens render media through [`MediaCache::resolve`]: hand it the remote
//! URL and it answers immediately with either the cached local file or the
//! URL itself while a background download fills the cache.
//!
//! # Features
//!
//! - **Non-blocking resolve**: never waits on the network; the remote URL is
//!   always a usable fallback
//! - **Self-healing**: entries whose file vanished out-of-band are dropped
//!   and re-downloaded
//! - **Single-flight downloads**: concurrent requests for one URL share one
//!   fetch
//! - **Durable index**: the URL table persists across launches and recovers
//!   from corruption by starting over
//!
//! # Example
//!
//! ```rust,no_run
//! use letswalk_media_cache::{MediaCache, MediaCacheConfig, MediaSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = MediaCache::open(MediaCacheConfig::from_env()).await?;
//!
//!     match cache.resolve("https://cdn.letswalk.app/walks/w1.jpg").await {
//!         MediaSource::Local(path) => println!("render {}", path.display()),
//!         MediaSource::Remote(url) => println!("render {url} while caching"),
//!         MediaSource::None => println!("nothing to render"),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
mod index;
mod inflight;
mod sniff;

pub use cache::{CacheStats, MediaCache, MediaSource};
pub use config::MediaCacheConfig;
pub use error::{CacheError, CacheResult};
pub use fetcher::{HttpFetcher, ObjectFetcher};
