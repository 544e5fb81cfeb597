//! Geospatial primitives for the "let's walk" discovery pipeline.
//!
//! This crate provides:
//! - Haversine great-circle distance (the distance every screen ranks by)
//! - A fast equirectangular approximation for coarse pre-filtering
//! - Generic proximity ranking: filter, annotate with distance, sort
//!
//! # Example
//!
//! ```
//! use letswalk_geo::{haversine_km, GeoPoint};
//!
//! let aliados = GeoPoint::new(41.1579, -8.6291); // Porto, Avenida dos Aliados
//! let lisbon = GeoPoint::new(38.7223, -9.1393);
//!
//! let distance_km = haversine_km(&aliados, &lisbon);
//! assert!((distance_km - 274.0).abs() < 5.0); // ~274 km
//! ```

#![warn(missing_docs)]

mod haversine;
mod rank;

pub use haversine::{approx_distance_km, haversine_km, haversine_m, EARTH_RADIUS_KM, EARTH_RADIUS_M};
pub use rank::{distances, rank, rank_within, Ranked};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point.
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns true if both coordinates are inside their valid ranges.
    ///
    /// Distance functions accept invalid points anyway: finite
    /// out-of-range values produce a finite but meaningless distance,
    /// and NaN coordinates propagate NaN (see [`rank`] for how NaN
    /// distances are ordered).
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

/// Anything with a position on the map.
///
/// Walks and user profiles implement this so the ranking functions can
/// stay generic over what is being ranked.
pub trait Locatable {
    /// The entity's position.
    fn position(&self) -> GeoPoint;
}

impl Locatable for GeoPoint {
    fn position(&self) -> GeoPoint {
        *self
    }
}
