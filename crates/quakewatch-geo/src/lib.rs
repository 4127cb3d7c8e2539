//! Spherical geodesy for the Quakewatch seismic risk engine.
//!
//! Every function here is pure and rejects malformed input with
//! [`GeoError::InvalidInput`] instead of clamping it.
//!
//! # Modules
//!
//! - [`distance`] -- Haversine great-circle distance and geographic midpoint.
//! - [`polygon`] -- Destination-point projection and the regular N-gon
//!   circle approximation used for risk-zone rendering.
//! - [`error`] -- Error types for geodesy operations.

pub mod distance;
pub mod error;
pub mod polygon;

pub use distance::{EARTH_RADIUS_KM, KM_PER_DEGREE, distance_km, midpoint};
pub use error::GeoError;
pub use polygon::{MIN_STEPS, build_polygon, destination};
