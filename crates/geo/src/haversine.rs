//! Haversine distance calculation.
//!
//! The haversine formula gives the great-circle distance between two
//! points on a sphere from their latitudes and longitudes. It is what
//! every discovery screen ranks walks and walkers by.

use crate::GeoPoint;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in kilometers.
///
/// Double-precision throughout; the result is deterministic for
/// identical inputs. NaN coordinates propagate a NaN distance.
///
/// # Example
/// ```
/// use letswalk_geo::{haversine_km, GeoPoint};
///
/// let aliados = GeoPoint::new(41.1579, -8.6291);
/// let cathedral = GeoPoint::new(41.1496, -8.6109);
///
/// let distance = haversine_km(&aliados, &cathedral);
/// assert!(distance > 1.0 && distance < 3.0); // about two km across Porto
/// ```
#[inline]
pub fn haversine_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    great_circle(from, to, EARTH_RADIUS_KM)
}

/// Great-circle distance between two points in meters.
#[inline]
pub fn haversine_m(from: &GeoPoint, to: &GeoPoint) -> f64 {
    great_circle(from, to, EARTH_RADIUS_M)
}

#[inline]
fn great_circle(from: &GeoPoint, to: &GeoPoint, radius: f64) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    radius * c
}

/// Fast approximate distance in kilometers (equirectangular projection).
///
/// Cheaper than haversine but increasingly wrong over long distances.
/// Useful as a coarse pre-filter over very large candidate sets before
/// exact ranking; it is deliberately not used by [`crate::rank_within`],
/// which must honor its radius boundary exactly.
#[inline]
pub fn approx_distance_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let x = (lon2 - lon1) * ((lat1 + lat2) / 2.0).cos();
    let y = lat2 - lat1;

    (x * x + y * y).sqrt() * EARTH_RADIUS_KM
}
