//! Proximity ranking: the shared pipeline behind "walks near me" and
//! "walkers near me".
//!
//! Every caller goes through the same three steps: apply the domain
//! eligibility filter, annotate survivors with haversine distance to the
//! observer, sort ascending. Filtering runs before any distance math so
//! ineligible candidates never cost a trig call.

use crate::haversine::haversine_km;
use crate::{GeoPoint, Locatable};
use serde::Serialize;
use std::cmp::Ordering;

/// A candidate annotated with its distance from the observer.
///
/// Produced fresh on every ranking call and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Ranked<T> {
    /// The candidate itself.
    pub item: T,
    /// Great-circle distance from the observer in kilometers.
    pub distance_km: f64,
}

/// Annotate candidates with distance from `observer`, preserving input
/// order. No filtering, no sorting.
pub fn distances<T, I>(observer: GeoPoint, candidates: I) -> Vec<Ranked<T>>
where
    T: Locatable,
    I: IntoIterator<Item = T>,
{
    candidates
        .into_iter()
        .map(|item| annotate(observer, item))
        .collect()
}

/// Filter candidates, annotate them with distance, and sort ascending.
///
/// The sort is stable: candidates at equal distance keep their input
/// order (that is the tie rule — no secondary key exists). NaN distances
/// (from NaN coordinates) sort after every real distance.
///
/// # Arguments
/// * `observer` - Reference position distances are measured from
/// * `candidates` - Candidate entities; may be empty
/// * `filter` - Domain eligibility predicate, evaluated before any
///   distance is computed
/// * `max_results` - Keep at most this many closest results (None for all)
pub fn rank<T, I, F>(
    observer: GeoPoint,
    candidates: I,
    filter: F,
    max_results: Option<usize>,
) -> Vec<Ranked<T>>
where
    T: Locatable,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> bool,
{
    let mut results: Vec<Ranked<T>> = candidates
        .into_iter()
        .filter(|c| filter(c))
        .map(|item| annotate(observer, item))
        .collect();

    results.sort_by(by_distance);

    if let Some(max) = max_results {
        results.truncate(max);
    }

    results
}

/// Like [`rank`], but additionally drops candidates farther than
/// `max_distance_km` from the observer.
///
/// The boundary is inclusive: a candidate exactly at `max_distance_km`
/// is kept, so `max_distance_km = 0.0` still returns candidates located
/// exactly at the observer's position. NaN distances never satisfy the
/// bound and are excluded here.
pub fn rank_within<T, I, F>(
    observer: GeoPoint,
    candidates: I,
    max_distance_km: f64,
    filter: F,
    max_results: Option<usize>,
) -> Vec<Ranked<T>>
where
    T: Locatable,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> bool,
{
    let mut results: Vec<Ranked<T>> = candidates
        .into_iter()
        .filter(|c| filter(c))
        .map(|item| annotate(observer, item))
        .filter(|r| r.distance_km <= max_distance_km)
        .collect();

    results.sort_by(by_distance);

    if let Some(max) = max_results {
        results.truncate(max);
    }

    results
}

#[inline]
fn annotate<T: Locatable>(observer: GeoPoint, item: T) -> Ranked<T> {
    let distance_km = haversine_km(&observer, &item.position());
    Ranked { item, distance_km }
}

/// Ascending by distance, NaN last.
fn by_distance<T>(a: &Ranked<T>, b: &Ranked<T>) -> Ordering {
    match (a.distance_km.is_nan(), b.distance_km.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal),
    }
}
