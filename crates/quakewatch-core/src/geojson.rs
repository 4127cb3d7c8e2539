//! GeoJSON projection of a [`RenderUpdate`](quakewatch_types::RenderUpdate).
//!
//! The map host consumes two `FeatureCollection`s: point markers and
//! risk-zone polygons. Both are rebuilt in full from each update.

use quakewatch_types::{EventRecord, EventSet, RiskZone};
use serde_json::{Value, json};

/// Magnitude/radius stops for the marker circle ramp.
const MARKER_RADIUS_STOPS: [(f64, f64); 3] = [(5.0, 6.0), (8.0, 12.0), (10.0, 20.0)];

/// Marker circle radius in pixels for a magnitude.
///
/// Linear between the stops `5 -> 6`, `8 -> 12`, `10 -> 20`; clamped to the
/// end values outside that range.
pub fn marker_radius(magnitude: f64) -> f64 {
    let mut lower = MARKER_RADIUS_STOPS[0];
    if magnitude <= lower.0 {
        return lower.1;
    }
    for upper in MARKER_RADIUS_STOPS.into_iter().skip(1) {
        if magnitude <= upper.0 {
            let t = (magnitude - lower.0) / (upper.0 - lower.0);
            return lower.1 + t * (upper.1 - lower.1);
        }
        lower = upper;
    }
    lower.1
}

/// Point `FeatureCollection` for the marker layer.
pub fn markers_geojson(events: &EventSet) -> Value {
    let features: Vec<Value> = events.iter().map(marker_feature).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Polygon `FeatureCollection` for the risk-zone layer.
pub fn risk_zones_geojson(zones: &[RiskZone]) -> Value {
    let features: Vec<Value> = zones.iter().map(zone_feature).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn marker_feature(event: &EventRecord) -> Value {
    json!({
        "type": "Feature",
        "id": event.id,
        "geometry": {
            "type": "Point",
            "coordinates": event.location.to_position(),
        },
        "properties": {
            "mag": event.magnitude,
            "place": event.place,
            "time": event.observed_at.timestamp_millis(),
            "depth_km": event.depth_km,
            "marker_radius": marker_radius(event.magnitude),
            "summary": event.summary(),
        },
    })
}

fn zone_feature(zone: &RiskZone) -> Value {
    let (first, second) = &zone.descriptor.source_pair_ids;
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [zone.polygon.positions()],
        },
        "properties": {
            "source_pair_ids": [first, second],
            "radius_km": zone.descriptor.radius_km,
            "center": zone.descriptor.center.to_position(),
        },
    })
}
