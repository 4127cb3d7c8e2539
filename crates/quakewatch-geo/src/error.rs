//! Error types for the `quakewatch-geo` crate.
//!
//! All fallible operations in this crate return [`GeoError`]. Nothing is
//! clamped: out-of-range input is rejected, never adjusted.

use quakewatch_types::GeoPoint;

/// Errors raised by the geodesy functions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// Malformed coordinates, a non-positive radius, or a degenerate step count.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GeoError {
    pub(crate) fn coordinate(point: GeoPoint) -> Self {
        Self::InvalidInput(format!(
            "coordinate {point} outside [-180, 180] x [-90, 90] or not finite"
        ))
    }
}

/// Reject points that are non-finite or outside the WGS84 ranges.
pub(crate) fn check_point(point: GeoPoint) -> Result<(), GeoError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(GeoError::coordinate(point))
    }
}
