//! The discovery feed: device position in, ranked candidates out.
//!
//! `DiscoveryFeed` is constructed once at app start with whatever
//! `LocationProvider` the platform offers and handed to the screens by
//! reference; there are no ambient singletons here.

use crate::models::{UserProfile, Walk};
use crate::query::{ProfileQuery, WalkQuery};
use async_trait::async_trait;
use letswalk_geo::{rank_within, GeoPoint, Ranked};
use std::sync::Arc;
use tracing::debug;

/// Where the device says the user currently is.
///
/// Implemented over the platform location service; `None` covers both
/// "denied" and "not available yet".
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// The current position, if the platform will give us one.
    async fn current_position(&self) -> Option<GeoPoint>;
}

/// Rank walks for a requester at a known observer position.
///
/// Pure: this is the walks call shape of the shared ranking pipeline.
pub fn rank_walks(observer: GeoPoint, walks: Vec<Walk>, query: &WalkQuery) -> Vec<Ranked<Walk>> {
    rank_within(
        observer,
        walks,
        query.radius_km,
        |walk| query.eligible(walk),
        query.max_results,
    )
}

/// Rank other walkers at a known observer position.
///
/// Pure: this is the profiles call shape of the shared ranking pipeline.
pub fn rank_profiles(
    observer: GeoPoint,
    profiles: Vec<UserProfile>,
    query: &ProfileQuery,
) -> Vec<Ranked<UserProfile>> {
    rank_within(
        observer,
        profiles,
        query.radius_km,
        |profile| query.eligible(profile),
        query.max_results,
    )
}

/// Discovery entry point for the screens.
///
/// Candidate collections are supplied by the caller — the data-access
/// layer fetches them, this type never queries the backend. Without a
/// device position there is nothing to rank and both feeds are empty.
#[derive(Clone)]
pub struct DiscoveryFeed {
    location: Arc<dyn LocationProvider>,
}

impl DiscoveryFeed {
    /// Build a feed over the given location provider.
    pub fn new(location: Arc<dyn LocationProvider>) -> Self {
        Self { location }
    }

    /// Walks near the user, closest first.
    pub async fn nearby_walks(&self, query: &WalkQuery, walks: Vec<Walk>) -> Vec<Ranked<Walk>> {
        let Some(observer) = self.location.current_position().await else {
            debug!(requester = %query.requester, "no device position, walk feed is empty");
            return Vec::new();
        };
        rank_walks(observer, walks, query)
    }

    /// Other walkers near the user, closest first.
    pub async fn nearby_profiles(
        &self,
        query: &ProfileQuery,
        profiles: Vec<UserProfile>,
    ) -> Vec<Ranked<UserProfile>> {
        let Some(observer) = self.location.current_position().await else {
            debug!(requester = %query.requester, "no device position, profile feed is empty");
            return Vec::new();
        };
        rank_profiles(observer, profiles, query)
    }
}
