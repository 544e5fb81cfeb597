//! The subset of the walk and profile documents that discovery needs.
//!
//! Both types arrive as JSON documents from the hosted database; fields
//! the screens use for layout only (titles, bios, ratings) stay out of
//! this crate.

use chrono::{DateTime, Utc};
use letswalk_geo::{GeoPoint, Locatable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A scheduled group walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Walk {
    /// Opaque document id.
    pub id: String,
    /// User id of the organizer.
    pub organizer: String,
    /// Scheduled start.
    pub starts_at: DateTime<Utc>,
    /// Meeting point.
    pub location: GeoPoint,
    /// Maximum number of participants, including nobody yet.
    pub capacity: u32,
    /// Ids of users who already joined. Never larger than `capacity`.
    #[serde(default)]
    pub participants: HashSet<String>,
    /// Set when the organizer called the walk off.
    #[serde(default)]
    pub cancelled: bool,
    /// Cover photo, if the organizer uploaded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Walk {
    /// Whether `user_id` has already joined this walk.
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }

    /// Whether the walk has no open spots left.
    ///
    /// Full walks still show up in discovery; joining them is refused by
    /// the backend, not hidden by ranking.
    pub fn is_full(&self) -> bool {
        self.participants.len() as u32 >= self.capacity
    }

    /// Number of spots still open.
    pub fn spots_left(&self) -> u32 {
        self.capacity.saturating_sub(self.participants.len() as u32)
    }
}

impl Locatable for Walk {
    fn position(&self) -> GeoPoint {
        self.location
    }
}

/// Another walker's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque document id.
    pub id: String,
    /// Last known position.
    pub position: GeoPoint,
    /// When the user last checked in, if ever.
    #[serde(default)]
    pub last_check_in: Option<DateTime<Utc>>,
    /// Profile picture, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Locatable for UserProfile {
    fn position(&self) -> GeoPoint {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_with_participants(capacity: u32, joined: &[&str]) -> Walk {
        Walk {
            id: "w1".into(),
            organizer: "ana".into(),
            starts_at: Utc::now(),
            location: GeoPoint::new(41.1579, -8.6291),
            capacity,
            participants: joined.iter().map(|s| s.to_string()).collect(),
            cancelled: false,
            image_url: None,
        }
    }

    #[test]
    fn test_participant_helpers() {
        let walk = walk_with_participants(3, &["maria", "joao"]);
        assert!(walk.has_participant("maria"));
        assert!(!walk.has_participant("rui"));
        assert!(!walk.is_full());
        assert_eq!(walk.spots_left(), 1);
    }

    #[test]
    fn test_full_walk() {
        let walk = walk_with_participants(2, &["maria", "joao"]);
        assert!(walk.is_full());
        assert_eq!(walk.spots_left(), 0);
    }

    #[test]
    fn test_walk_deserializes_from_document_shape() {
        let walk: Walk = serde_json::from_str(
            r#"{
                "id": "walk-42",
                "organizer": "ana",
                "starts_at": "2026-09-01T09:30:00Z",
                "location": { "latitude": 41.1496, "longitude": -8.6109 },
                "capacity": 8,
                "participants": ["maria"],
                "cancelled": false,
                "image_url": "https://cdn.letswalk.app/walks/42.jpg"
            }"#,
        )
        .unwrap();
        assert_eq!(walk.id, "walk-42");
        assert!(walk.has_participant("maria"));
        assert_eq!(walk.spots_left(), 7);
    }

    #[test]
    fn test_walk_optional_fields_default() {
        // Older documents carry neither participants nor the flags
        let walk: Walk = serde_json::from_str(
            r#"{
                "id": "walk-7",
                "organizer": "rui",
                "starts_at": "2026-09-02T18:00:00Z",
                "location": { "latitude": 41.15, "longitude": -8.61 },
                "capacity": 5
            }"#,
        )
        .unwrap();
        assert!(walk.participants.is_empty());
        assert!(!walk.cancelled);
        assert!(walk.image_url.is_none());
    }

    #[test]
    fn test_profile_deserializes() {
        let profile: UserProfile = serde_json::from_str(
            r#"{
                "id": "user-9",
                "position": { "latitude": 41.16, "longitude": -8.62 },
                "last_check_in": "2026-08-20T07:15:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(profile.id, "user-9");
        assert!(profile.last_check_in.is_some());
        assert!(profile.avatar_url.is_none());
    }

    #[test]
    fn test_walk_position_is_location() {
        let walk = walk_with_participants(3, &[]);
        assert_eq!(walk.position(), walk.location);
    }
}
