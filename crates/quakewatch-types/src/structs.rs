//! Core data model: event records, event sets, risk zones, and the
//! per-cycle render update handed to the map host.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::EventSetError;
use crate::ids::EventId;

// ---------------------------------------------------------------------------
// GeoPoint
// ---------------------------------------------------------------------------

/// A WGS84 coordinate in degrees.
///
/// Construction does not validate ranges; the geodesy functions that consume
/// points reject out-of-range or non-finite values with `InvalidInput`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GeoPoint {
    /// Longitude in degrees, valid range `[-180, 180]`.
    pub lon: f64,
    /// Latitude in degrees, valid range `[-90, 90]`.
    pub lat: f64,
}

impl GeoPoint {
    /// Create a point from longitude and latitude (in that order).
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Whether both coordinates are finite and inside their WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// The point as a GeoJSON `[lon, lat]` position.
    pub const fn to_position(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl core::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.lon, self.lat)
    }
}

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// One normalized seismic event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventRecord {
    /// Stable upstream identifier.
    pub id: EventId,
    /// Epicenter.
    pub location: GeoPoint,
    /// Magnitude (non-negative).
    pub magnitude: f64,
    /// Human-readable place label, e.g. `"45 km SW of Town, Region"`.
    pub place: String,
    /// When the event occurred.
    pub observed_at: DateTime<Utc>,
    /// Hypocenter depth in kilometers, when the feed reports one.
    #[serde(default)]
    pub depth_km: Option<f64>,
}

impl EventRecord {
    /// Hover/popup text for a marker: place, magnitude, and UTC time.
    pub fn summary(&self) -> String {
        format!(
            "{}\nMag: {:.1}\n{}",
            self.place,
            self.magnitude,
            self.observed_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    /// Notification title for a newly arrived event, e.g. `M6.1 quake`.
    pub fn alert_title(&self) -> String {
        format!("M{:.1} quake", self.magnitude)
    }
}

// ---------------------------------------------------------------------------
// EventSet
// ---------------------------------------------------------------------------

/// The events materialized by one fetch, in feed order, with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<EventRecord>", try_from = "Vec<EventRecord>")]
pub struct EventSet {
    events: Vec<EventRecord>,
}

impl EventSet {
    /// Build a set from records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`EventSetError::DuplicateEvent`] if two records share an id.
    pub fn new(events: Vec<EventRecord>) -> Result<Self, EventSetError> {
        let mut seen = BTreeSet::new();
        for event in &events {
            if !seen.insert(&event.id) {
                return Err(EventSetError::DuplicateEvent(event.id.clone()));
            }
        }
        Ok(Self { events })
    }

    /// An empty set.
    pub const fn empty() -> Self {
        Self { events: Vec::new() }
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the set has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate events in feed order.
    pub fn iter(&self) -> core::slice::Iter<'_, EventRecord> {
        self.events.iter()
    }

    /// The events as a slice, in feed order.
    pub fn as_slice(&self) -> &[EventRecord] {
        &self.events
    }

    /// Look up an event by identifier.
    pub fn get(&self, id: &EventId) -> Option<&EventRecord> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// The set of identifiers in this set.
    pub fn ids(&self) -> BTreeSet<&EventId> {
        self.events.iter().map(|e| &e.id).collect()
    }

    /// Consume the set, returning the records in feed order.
    pub fn into_vec(self) -> Vec<EventRecord> {
        self.events
    }
}

impl TryFrom<Vec<EventRecord>> for EventSet {
    type Error = EventSetError;

    fn try_from(events: Vec<EventRecord>) -> Result<Self, Self::Error> {
        Self::new(events)
    }
}

impl From<EventSet> for Vec<EventRecord> {
    fn from(set: EventSet) -> Self {
        set.events
    }
}

impl<'a> IntoIterator for &'a EventSet {
    type Item = &'a EventRecord;
    type IntoIter = core::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// ---------------------------------------------------------------------------
// Risk zones
// ---------------------------------------------------------------------------

/// A circular risk area derived from one pair of nearby events.
///
/// `center` is the geographic midpoint of the pair and `radius_km` half their
/// great-circle separation. Descriptors are recomputed every cycle and carry
/// no identity of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RiskZoneDescriptor {
    /// Midpoint of the originating pair.
    pub center: GeoPoint,
    /// Half the distance between the pair, in kilometers.
    pub radius_km: f64,
    /// Identifiers of the two events, in feed order.
    pub source_pair_ids: (EventId, EventId),
}

impl RiskZoneDescriptor {
    /// Whether the zone has zero area (co-located pair).
    pub fn is_degenerate(&self) -> bool {
        self.radius_km <= 0.0
    }

    /// Whether this zone came from the given pair, in either order.
    pub fn is_pair(&self, a: &EventId, b: &EventId) -> bool {
        let (first, second) = &self.source_pair_ids;
        (first == a && second == b) || (first == b && second == a)
    }
}

/// A closed polygon ring: the last vertex repeats the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Polygon {
    /// Ring vertices, explicitly closed.
    pub ring: Vec<GeoPoint>,
}

impl Polygon {
    /// Whether the ring has at least four vertices and ends where it starts.
    pub fn is_closed(&self) -> bool {
        self.ring.len() >= 4 && self.ring.first() == self.ring.last()
    }

    /// The ring as GeoJSON `[[lon, lat], ...]` positions.
    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.ring.iter().map(|p| p.to_position()).collect()
    }
}

/// A risk-zone descriptor paired with its polygon approximation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RiskZone {
    /// The pair-derived circle.
    pub descriptor: RiskZoneDescriptor,
    /// Polygon approximating the circle on the sphere.
    pub polygon: Polygon,
}

// ---------------------------------------------------------------------------
// RenderUpdate
// ---------------------------------------------------------------------------

/// Output of one planner cycle, consumed immediately by the sinks.
///
/// Both layers are full replacements; nothing here is a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RenderUpdate {
    /// Every event in the current set (point-marker layer).
    #[ts(as = "Vec<EventRecord>")]
    pub markers: EventSet,
    /// Every qualifying risk zone with its polygon (area layer).
    pub risk_zones: Vec<RiskZone>,
    /// Events new since the last committed cycle that meet the magnitude
    /// threshold, in feed order.
    pub new_significant_events: Vec<EventRecord>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(id: &str, lon: f64, lat: f64, mag: f64) -> EventRecord {
        EventRecord {
            id: EventId::from(id),
            location: GeoPoint::new(lon, lat),
            magnitude: mag,
            place: format!("near {id}"),
            observed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            depth_km: Some(10.0),
        }
    }

    #[test]
    fn event_set_rejects_duplicate_ids() {
        let result = EventSet::new(vec![record("a", 0.0, 0.0, 5.0), record("a", 1.0, 1.0, 6.0)]);
        assert_eq!(
            result.unwrap_err(),
            EventSetError::DuplicateEvent(EventId::from("a"))
        );
    }

    #[test]
    fn event_set_preserves_feed_order() {
        let set = EventSet::new(vec![
            record("c", 0.0, 0.0, 5.0),
            record("a", 0.0, 0.0, 5.0),
            record("b", 0.0, 0.0, 5.0),
        ])
        .unwrap();
        let ids: Vec<&str> = set.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert!(set.get(&EventId::from("a")).is_some());
        assert!(set.get(&EventId::from("z")).is_none());
    }

    #[test]
    fn event_set_deserialization_enforces_uniqueness() {
        let json = serde_json::to_string(&vec![
            record("a", 0.0, 0.0, 5.0),
            record("a", 0.0, 0.0, 5.0),
        ])
        .unwrap();
        assert!(serde_json::from_str::<EventSet>(&json).is_err());
    }

    #[test]
    fn geo_point_validity() {
        assert!(GeoPoint::new(180.0, -90.0).is_valid());
        assert!(!GeoPoint::new(180.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 90.1).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn summary_and_alert_title() {
        let event = record("a", 0.0, 0.0, 6.04);
        assert_eq!(event.alert_title(), "M6.0 quake");
        assert_eq!(event.summary(), "near a\nMag: 6.0\n2024-03-01 12:30:00 UTC");
    }

    #[test]
    fn polygon_closure() {
        let open = Polygon {
            ring: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(1.0, 0.0),
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(0.0, 1.0),
            ],
        };
        assert!(!open.is_closed());

        let mut closed = open.clone();
        closed.ring.push(GeoPoint::new(0.0, 0.0));
        assert!(closed.is_closed());
        assert_eq!(closed.positions().len(), 5);
    }

    #[test]
    fn descriptor_pair_matching_is_unordered() {
        let zone = RiskZoneDescriptor {
            center: GeoPoint::new(0.0, 0.05),
            radius_km: 5.5,
            source_pair_ids: (EventId::from("1"), EventId::from("2")),
        };
        assert!(zone.is_pair(&EventId::from("2"), &EventId::from("1")));
        assert!(!zone.is_pair(&EventId::from("1"), &EventId::from("3")));
        assert!(!zone.is_degenerate());
    }
}
