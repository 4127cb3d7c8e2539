//! Great-circle distance and midpoint on a spherical Earth.
//!
//! Uses the haversine formula with the mean Earth radius, which is accurate
//! to well under a percent for the tens-of-kilometers separations the risk
//! clustering cares about.

use std::cmp::Ordering;

use quakewatch_types::GeoPoint;

use crate::error::{GeoError, check_point};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Kilometers spanned by one degree of latitude (or of longitude at the equator).
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * core::f64::consts::PI / 180.0;

/// Great-circle distance between two points, in kilometers.
///
/// The result does not depend on argument order, and is exactly `0.0` for
/// identical points.
///
/// # Errors
///
/// Returns [`GeoError::InvalidInput`] if either point is non-finite or out of
/// range.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> Result<f64, GeoError> {
    check_point(a)?;
    check_point(b)?;

    // Evaluate in a canonical order so floating-point rounding is identical
    // for (a, b) and (b, a).
    let (p, q) = match canonical_order(a, b) {
        Ordering::Greater => (b, a),
        Ordering::Less | Ordering::Equal => (a, b),
    };

    let phi1 = p.lat.to_radians();
    let phi2 = q.lat.to_radians();
    let d_phi = (q.lat - p.lat).to_radians();
    let d_lambda = (q.lon - p.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    Ok(EARTH_RADIUS_KM * c)
}

/// Geographic midpoint of the great-circle segment between two points.
///
/// # Errors
///
/// Returns [`GeoError::InvalidInput`] if either point is non-finite or out of
/// range.
pub fn midpoint(a: GeoPoint, b: GeoPoint) -> Result<GeoPoint, GeoError> {
    check_point(a)?;
    check_point(b)?;

    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let lambda1 = a.lon.to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let bx = phi2.cos() * d_lambda.cos();
    let by = phi2.cos() * d_lambda.sin();
    let phi_m = (phi1.sin() + phi2.sin()).atan2((phi1.cos() + bx).hypot(by));
    let lambda_m = lambda1 + by.atan2(phi1.cos() + bx);

    Ok(GeoPoint::new(
        normalize_lon(lambda_m.to_degrees()),
        phi_m.to_degrees(),
    ))
}

/// Wrap a longitude in degrees into `[-180, 180]`.
pub(crate) fn normalize_lon(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 540.0).rem_euclid(360.0) - 180.0
    }
}

fn canonical_order(a: GeoPoint, b: GeoPoint) -> Ordering {
    a.lon.total_cmp(&b.lon).then(a.lat.total_cmp(&b.lat))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat)
    }

    #[test]
    fn zero_for_identical_points() {
        let p = pt(142.37, 38.29);
        assert_eq!(distance_km(p, p).unwrap(), 0.0);
    }

    #[test]
    fn symmetric_bit_for_bit() {
        let pairs = [
            (pt(0.0, 0.0), pt(0.0, 0.1)),
            (pt(-122.42, 37.77), pt(139.69, 35.69)),
            (pt(179.9, -15.0), pt(-179.9, -15.2)),
            (pt(12.5, 89.0), pt(-167.5, 89.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance_km(a, b).unwrap(), distance_km(b, a).unwrap());
        }
    }

    #[test]
    fn one_tenth_degree_of_latitude() {
        let d = distance_km(pt(0.0, 0.0), pt(0.0, 0.1)).unwrap();
        assert!((d - 11.119_5).abs() < 0.001, "got {d}");
    }

    #[test]
    fn crosses_antimeridian_the_short_way() {
        let d = distance_km(pt(179.95, 0.0), pt(-179.95, 0.0)).unwrap();
        assert!((d - 0.1 * KM_PER_DEGREE).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn rejects_out_of_range_and_non_finite() {
        assert!(matches!(
            distance_km(pt(181.0, 0.0), pt(0.0, 0.0)),
            Err(GeoError::InvalidInput(_))
        ));
        assert!(distance_km(pt(0.0, 0.0), pt(0.0, -90.5)).is_err());
        assert!(distance_km(pt(f64::NAN, 0.0), pt(0.0, 0.0)).is_err());
        assert!(midpoint(pt(0.0, f64::INFINITY), pt(0.0, 0.0)).is_err());
    }

    #[test]
    fn midpoint_along_meridian() {
        let m = midpoint(pt(0.0, 0.0), pt(0.0, 0.1)).unwrap();
        assert!(m.lon.abs() < 1e-12);
        assert!((m.lat - 0.05).abs() < 1e-9);
    }

    #[test]
    fn midpoint_is_equidistant() {
        let a = pt(-70.6, -33.4);
        let b = pt(-70.4, -33.5);
        let m = midpoint(a, b).unwrap();
        let da = distance_km(a, m).unwrap();
        let db = distance_km(b, m).unwrap();
        assert!((da - db).abs() < 1e-6);
        let whole = distance_km(a, b).unwrap();
        assert!((da + db - whole).abs() < 1e-6);
    }

    #[test]
    fn midpoint_across_antimeridian_stays_in_range() {
        let m = midpoint(pt(179.9, 10.0), pt(-179.9, 10.0)).unwrap();
        assert!(m.is_valid());
        assert!((m.lon.abs() - 180.0).abs() < 1e-6, "got {m}");
    }

    #[test]
    fn normalize_wraps_longitudes() {
        assert_eq!(normalize_lon(190.0), -170.0);
        assert_eq!(normalize_lon(-190.0), 170.0);
        assert_eq!(normalize_lon(45.0), 45.0);
    }
}
