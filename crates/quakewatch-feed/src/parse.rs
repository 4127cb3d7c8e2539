//! GeoJSON `FeatureCollection` parsing into an [`EventSet`].
//!
//! The FDSN event service returns one `Feature` per event:
//!
//! ```text
//! { "type": "Feature", "id": "us7000abcd",
//!   "properties": { "mag": 5.4, "place": "...", "time": 1717228800000, ... },
//!   "geometry": { "type": "Point", "coordinates": [lon, lat, depth_km] } }
//! ```
//!
//! Features without a magnitude are skipped; anything else that does not
//! fit the model rejects the whole document.

use chrono::DateTime;
use quakewatch_types::{EventId, EventRecord, EventSet, GeoPoint};
use serde::Deserialize;
use tracing::debug;

use crate::error::FeedError;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    #[serde(default)]
    mag: Option<f64>,
    #[serde(default)]
    place: Option<String>,
    #[serde(default)]
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

/// Parse a GeoJSON feed body into an event set, preserving feature order.
///
/// # Errors
///
/// Returns [`FeedError::Json`] for invalid JSON and [`FeedError::Malformed`]
/// for a document that is not a `FeatureCollection`, a feature without id,
/// time, or valid coordinates, a negative magnitude, or duplicate ids.
pub fn parse_feature_collection(body: &str) -> Result<EventSet, FeedError> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    if collection.kind != "FeatureCollection" {
        return Err(FeedError::Malformed(format!(
            "expected FeatureCollection, got {}",
            collection.kind
        )));
    }

    let mut records = Vec::with_capacity(collection.features.len());
    let mut skipped: usize = 0;
    for feature in collection.features {
        match feature_to_record(feature)? {
            Some(record) => records.push(record),
            None => skipped = skipped.saturating_add(1),
        }
    }
    if skipped > 0 {
        debug!(skipped, "Skipped features without magnitude");
    }

    EventSet::new(records).map_err(|e| FeedError::Malformed(e.to_string()))
}

fn feature_to_record(feature: Feature) -> Result<Option<EventRecord>, FeedError> {
    let id = feature
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FeedError::Malformed("feature without id".to_owned()))?;

    let Some(magnitude) = feature.properties.mag else {
        return Ok(None);
    };
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(FeedError::Malformed(format!(
            "event {id}: magnitude {magnitude} is not a non-negative number"
        )));
    }

    let millis = feature
        .properties
        .time
        .ok_or_else(|| FeedError::Malformed(format!("event {id}: missing time")))?;
    let observed_at = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| FeedError::Malformed(format!("event {id}: time {millis} out of range")))?;

    let coordinates = feature
        .geometry
        .map(|g| g.coordinates)
        .ok_or_else(|| FeedError::Malformed(format!("event {id}: missing geometry")))?;
    let (Some(&lon), Some(&lat)) = (coordinates.first(), coordinates.get(1)) else {
        return Err(FeedError::Malformed(format!(
            "event {id}: expected [lon, lat, depth] coordinates"
        )));
    };
    let location = GeoPoint::new(lon, lat);
    if !location.is_valid() {
        return Err(FeedError::Malformed(format!(
            "event {id}: coordinate {location} out of range"
        )));
    }

    Ok(Some(EventRecord {
        id: EventId::new(id),
        location,
        magnitude,
        place: feature.properties.place.unwrap_or_default(),
        observed_at,
        depth_km: coordinates.get(2).copied(),
    }))
}
