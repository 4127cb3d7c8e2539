//! Circle approximation on the sphere.
//!
//! [`build_polygon`] walks `steps` equally spaced bearings around a center
//! and projects each one `radius_km` away along a great circle. Bearings
//! decrease from north, so the ring winds counterclockwise, which is the
//! GeoJSON exterior-ring convention.

use quakewatch_types::{GeoPoint, Polygon};

use crate::distance::{EARTH_RADIUS_KM, normalize_lon};
use crate::error::{GeoError, check_point};

/// Minimum number of sides for a polygon approximation.
pub const MIN_STEPS: u32 = 3;

/// The point reached by travelling `distance_km` from `origin` on the given
/// initial bearing (radians, clockwise from north).
///
/// # Errors
///
/// Returns [`GeoError::InvalidInput`] if `origin` is out of range or the
/// distance or bearing is not finite.
pub fn destination(origin: GeoPoint, distance_km: f64, bearing: f64) -> Result<GeoPoint, GeoError> {
    check_point(origin)?;
    if !distance_km.is_finite() || !bearing.is_finite() {
        return Err(GeoError::InvalidInput(format!(
            "distance {distance_km} km / bearing {bearing} rad must be finite"
        )));
    }
    Ok(project(origin, distance_km / EARTH_RADIUS_KM, bearing))
}

/// Build a closed ring of `steps + 1` vertices approximating a circle of
/// `radius_km` around `center`.
///
/// Vertex `i` sits at bearing `-i * 2π / steps`; the final vertex repeats the
/// first. Output is a pure function of the inputs.
///
/// # Errors
///
/// Returns [`GeoError::InvalidInput`] if `center` is out of range, if
/// `radius_km` is not a positive finite number, or if `steps < 3`.
pub fn build_polygon(center: GeoPoint, radius_km: f64, steps: u32) -> Result<Polygon, GeoError> {
    check_point(center)?;
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(GeoError::InvalidInput(format!(
            "radius must be positive and finite, got {radius_km} km"
        )));
    }
    if steps < MIN_STEPS {
        return Err(GeoError::InvalidInput(format!(
            "polygon needs at least {MIN_STEPS} steps, got {steps}"
        )));
    }

    let angular = radius_km / EARTH_RADIUS_KM;
    let step = core::f64::consts::TAU / f64::from(steps);

    let mut ring: Vec<GeoPoint> = (0..steps)
        .map(|i| project(center, angular, -f64::from(i) * step))
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }

    Ok(Polygon { ring })
}

/// Great-circle projection by an angular distance (radians).
fn project(origin: GeoPoint, angular: f64, bearing: f64) -> GeoPoint {
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lon.to_radians();

    let sin_phi2 = phi1.sin() * angular.cos() + phi1.cos() * angular.sin() * bearing.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (bearing.sin() * angular.sin() * phi1.cos()).atan2(angular.cos() - phi1.sin() * sin_phi2);

    GeoPoint::new(normalize_lon(lambda2.to_degrees()), phi2.to_degrees())
}
