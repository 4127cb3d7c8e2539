//! Proximity clusterer: one risk zone per pair of nearby events.
//!
//! Every unordered pair whose great-circle distance is within the threshold
//! (inclusive) yields an independent [`RiskZoneDescriptor`]. Overlapping or
//! nested zones are not merged.
//!
//! Which pairs get measured is delegated to a [`CandidatePairs`] strategy.
//! A strategy may prune pairs that cannot qualify but must never drop one
//! that can, so every strategy yields the same descriptors as [`AllPairs`].

use std::collections::BTreeMap;

use quakewatch_geo::{GeoError, KM_PER_DEGREE, distance_km, midpoint};
use quakewatch_types::{EventId, EventSet, GeoPoint, RiskZoneDescriptor};
use serde::Deserialize;

/// Errors raised while clustering an event set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusterError {
    /// The proximity threshold is negative or not finite.
    #[error("invalid input: proximity threshold must be a non-negative number, got {0} km")]
    InvalidThreshold(f64),

    /// An event carries coordinates the geodesy layer rejects.
    #[error("event {id}: {source}")]
    InvalidLocation {
        /// The offending event.
        id: EventId,
        /// The underlying geodesy error.
        source: GeoError,
    },

    /// A geodesy computation failed for a pair.
    #[error("pair ({first}, {second}): {source}")]
    Geo {
        /// First event of the pair.
        first: EventId,
        /// Second event of the pair.
        second: EventId,
        /// The underlying geodesy error.
        source: GeoError,
    },

    /// A candidate-pair strategy produced an index outside the event set.
    #[error("candidate pair ({0}, {1}) out of range")]
    PairOutOfRange(usize, usize),
}

/// Generates the index pairs whose distance is measured.
///
/// Orientation does not matter: `(i, j)` and `(j, i)` name the same pair, and
/// self-pairs are ignored.
pub trait CandidatePairs {
    /// Every pair of `points` that could lie within `threshold_km`.
    ///
    /// May include pairs that turn out to be farther apart; must not omit any
    /// pair that is within the threshold.
    fn candidate_pairs(&self, points: &[GeoPoint], threshold_km: f64) -> Vec<(usize, usize)>;
}

/// Exhaustive quadratic scan. The reference strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPairs;

impl CandidatePairs for AllPairs {
    fn candidate_pairs(&self, points: &[GeoPoint], _threshold_km: f64) -> Vec<(usize, usize)> {
        let n = points.len();
        (0..n)
            .flat_map(|i| (i.saturating_add(1)..n).map(move |j| (i, j)))
            .collect()
    }
}

/// Buckets events into latitude bands at least `threshold_km` tall and only
/// compares events in the same or adjacent bands.
///
/// Great-circle distance is never shorter than the meridional separation,
/// so a pair more than one band apart cannot qualify.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatitudeBands;

impl LatitudeBands {
    /// Relative slack on the band height to absorb rounding in the haversine.
    const SLACK: f64 = 1e-9;

    #[allow(clippy::cast_possible_truncation)]
    fn band_of(lat: f64, height_deg: f64) -> i64 {
        ((lat + 90.0) / height_deg).floor() as i64
    }
}

impl CandidatePairs for LatitudeBands {
    fn candidate_pairs(&self, points: &[GeoPoint], threshold_km: f64) -> Vec<(usize, usize)> {
        let height_deg = threshold_km / KM_PER_DEGREE * (1.0 + Self::SLACK);
        if height_deg <= 0.0 {
            return AllPairs.candidate_pairs(points, threshold_km);
        }

        let mut bands: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (index, point) in points.iter().enumerate() {
            bands
                .entry(Self::band_of(point.lat, height_deg))
                .or_default()
                .push(index);
        }

        let mut pairs = Vec::new();
        for (band, members) in &bands {
            for (pos, &i) in members.iter().enumerate() {
                for &j in members.iter().skip(pos.saturating_add(1)) {
                    pairs.push((i, j));
                }
            }
            let next = band.checked_add(1).and_then(|b| bands.get(&b));
            for &i in members {
                for &j in next.into_iter().flatten() {
                    pairs.push((i.min(j), i.max(j)));
                }
            }
        }
        pairs
    }
}

/// Configurable choice of [`CandidatePairs`] strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStrategy {
    /// [`AllPairs`].
    #[default]
    AllPairs,
    /// [`LatitudeBands`].
    LatitudeBands,
}

impl PairStrategy {
    /// The strategy implementation.
    pub fn generator(self) -> &'static dyn CandidatePairs {
        match self {
            Self::AllPairs => &AllPairs,
            Self::LatitudeBands => &LatitudeBands,
        }
    }
}

/// Cluster with the exhaustive [`AllPairs`] strategy.
///
/// # Errors
///
/// See [`cluster_with`].
pub fn cluster(
    events: &EventSet,
    threshold_km: f64,
) -> Result<Vec<RiskZoneDescriptor>, ClusterError> {
    cluster_with(events, threshold_km, &AllPairs)
}

/// Emit one descriptor per unordered pair within `threshold_km` (inclusive),
/// ordered by the pair's positions in `events`.
///
/// Co-located pairs produce zero-radius descriptors.
///
/// # Errors
///
/// Returns [`ClusterError::InvalidThreshold`] for a negative or non-finite
/// threshold and [`ClusterError::InvalidLocation`] if any event has malformed
/// coordinates, regardless of strategy or set size.
pub fn cluster_with(
    events: &EventSet,
    threshold_km: f64,
    strategy: &dyn CandidatePairs,
) -> Result<Vec<RiskZoneDescriptor>, ClusterError> {
    if !threshold_km.is_finite() || threshold_km < 0.0 {
        return Err(ClusterError::InvalidThreshold(threshold_km));
    }

    let records = events.as_slice();
    let mut points = Vec::with_capacity(records.len());
    for record in records {
        if !record.location.is_valid() {
            return Err(ClusterError::InvalidLocation {
                id: record.id.clone(),
                source: GeoError::InvalidInput(format!(
                    "coordinate {} outside [-180, 180] x [-90, 90] or not finite",
                    record.location
                )),
            });
        }
        points.push(record.location);
    }

    // Strategies may emit a pair in either orientation.
    let mut pairs: Vec<(usize, usize)> = strategy
        .candidate_pairs(&points, threshold_km)
        .into_iter()
        .filter(|&(i, j)| i != j)
        .map(|(i, j)| (i.min(j), i.max(j)))
        .collect();
    pairs.sort_unstable();
    pairs.dedup();

    let mut zones = Vec::new();
    for (i, j) in pairs {
        let (Some(a), Some(b)) = (records.get(i), records.get(j)) else {
            return Err(ClusterError::PairOutOfRange(i, j));
        };
        let geo_err = |source| ClusterError::Geo {
            first: a.id.clone(),
            second: b.id.clone(),
            source,
        };

        let distance = distance_km(a.location, b.location).map_err(geo_err)?;
        if distance > threshold_km {
            continue;
        }
        let center = midpoint(a.location, b.location).map_err(geo_err)?;
        zones.push(RiskZoneDescriptor {
            center,
            radius_km: distance / 2.0,
            source_pair_ids: (a.id.clone(), b.id.clone()),
        });
    }

    Ok(zones)
}
