//! Discovery layer for "let's walk": which walks and which walkers are
//! near the user, closest first.
//!
//! The screens feed this crate raw collections fetched by the data-access
//! layer; nothing here talks to the backend. Both discovery surfaces —
//! walks and other walkers — are the same generic ranking pipeline from
//! `letswalk-geo` with different eligibility predicates plugged in.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use letswalk_discovery::{rank_walks, TimeWindow, Walk, WalkQuery};
//! use letswalk_geo::GeoPoint;
//!
//! let observer = GeoPoint::new(41.1579, -8.6291);
//! let query = WalkQuery::new("maria", 10.0, TimeWindow::upcoming(Utc::now(), 14));
//! let ranked = rank_walks(observer, Vec::<Walk>::new(), &query);
//! assert!(ranked.is_empty());
//! ```

#![warn(missing_docs)]

mod feed;
mod models;
mod query;

pub use feed::{rank_profiles, rank_walks, DiscoveryFeed, LocationProvider};
pub use models::{UserProfile, Walk};
pub use query::{ProfileQuery, QueryError, TimeWindow, WalkQuery};
