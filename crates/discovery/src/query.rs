//! Query parameters and eligibility rules for the two discovery surfaces.
//!
//! Eligibility runs before any distance math (see `letswalk-geo`), so
//! these predicates are where cancelled walks, already-joined walks and
//! the requester's own profile drop out.

use crate::models::{UserProfile, Walk};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inclusive time window a walk's start must fall inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest acceptable start (inclusive).
    pub from: DateTime<Utc>,
    /// Latest acceptable start (inclusive).
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// Window over explicit bounds.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The window the walks screen uses: from `now` until `days` from now.
    pub fn upcoming(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            from: now,
            to: now + Duration::days(days),
        }
    }

    /// Whether `instant` falls inside the window, bounds included.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// A window whose end precedes its start matches nothing.
    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}

/// Rejected query parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Radius was negative, NaN or infinite.
    #[error("search radius must be finite and non-negative, got {0}")]
    InvalidRadius(f64),

    /// The window's end precedes its start.
    #[error("time window ends before it starts")]
    EmptyWindow,
}

/// Parameters for "walks near me".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkQuery {
    /// Id of the user asking; their own and already-joined walks drop out.
    pub requester: String,
    /// Search radius in kilometers (inclusive boundary).
    pub radius_km: f64,
    /// Window the walk's start must fall inside.
    pub window: TimeWindow,
    /// Cap on returned results (None for all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl WalkQuery {
    /// A query with no result cap.
    pub fn new(requester: impl Into<String>, radius_km: f64, window: TimeWindow) -> Self {
        Self {
            requester: requester.into(),
            radius_km,
            window,
            max_results: None,
        }
    }

    /// Builder-style result cap.
    #[must_use]
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Validate the parameters.
    ///
    /// Ranking itself is total and never checks these; call this at the
    /// edge where user input becomes a query.
    pub fn validate(&self) -> Result<(), QueryError> {
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            return Err(QueryError::InvalidRadius(self.radius_km));
        }
        if self.window.is_empty() {
            return Err(QueryError::EmptyWindow);
        }
        Ok(())
    }

    /// Whether `walk` should appear in this requester's feed at all
    /// (distance aside).
    pub fn eligible(&self, walk: &Walk) -> bool {
        !walk.cancelled
            && self.window.contains(walk.starts_at)
            && walk.organizer != self.requester
            && !walk.has_participant(&self.requester)
    }
}

/// Parameters for "walkers near me".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileQuery {
    /// Id of the user asking; their own profile drops out.
    pub requester: String,
    /// Search radius in kilometers (inclusive boundary).
    pub radius_km: f64,
    /// Cap on returned results (None for all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl ProfileQuery {
    /// A query with no result cap.
    pub fn new(requester: impl Into<String>, radius_km: f64) -> Self {
        Self {
            requester: requester.into(),
            radius_km,
            max_results: None,
        }
    }

    /// Builder-style result cap.
    #[must_use]
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), QueryError> {
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            return Err(QueryError::InvalidRadius(self.radius_km));
        }
        Ok(())
    }

    /// Everyone but the requester is eligible.
    pub fn eligible(&self, profile: &UserProfile) -> bool {
        profile.id != self.requester
    }
}
