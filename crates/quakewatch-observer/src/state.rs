//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds a [`watch`] channel carrying the latest
//! [`ObserverSnapshot`] and a broadcast channel for alert streaming. The
//! refresh loop writes through [`AppState::publish_update`],
//! [`AppState::publish_alert`] and [`AppState::record_failure`], all of
//! which are synchronous so they can be called from a render sink.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use quakewatch_core::geojson::{markers_geojson, risk_zones_geojson};
use quakewatch_types::{EventRecord, RenderUpdate};
use serde_json::Value;
use tokio::sync::{broadcast, watch};

/// Capacity of the broadcast channel for alerts.
///
/// A subscriber that falls behind by more than this many alerts receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// Number of recent alerts retained for `GET /api/alerts`.
pub const MAX_RECENT_ALERTS: usize = 100;

/// The last failed refresh cycle.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FailureRecord {
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
    /// Rendered error message.
    pub message: String,
}

/// Refresh-cycle bookkeeping shown by `GET /api/status`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CycleStatus {
    /// Updates received since startup.
    pub updates_applied: u64,
    /// Failed cycles since startup.
    pub failures: u64,
    /// When the most recent update arrived.
    pub last_update_at: Option<DateTime<Utc>>,
    /// The most recent failure, if any.
    pub last_failure: Option<FailureRecord>,
}

/// In-memory view of the latest committed cycle.
#[derive(Debug, Clone)]
pub struct ObserverSnapshot {
    /// The latest render update as received.
    pub update: RenderUpdate,
    /// Marker layer as a GeoJSON `FeatureCollection`.
    pub markers: Value,
    /// Risk-zone layer as a GeoJSON `FeatureCollection`.
    pub risk_zones: Value,
    /// Cycle bookkeeping.
    pub status: CycleStatus,
    /// Recent alerts, newest first, capped at [`MAX_RECENT_ALERTS`].
    pub alerts: VecDeque<EventRecord>,
}

impl Default for ObserverSnapshot {
    fn default() -> Self {
        let update = RenderUpdate::default();
        Self {
            markers: markers_geojson(&update.markers),
            risk_zones: risk_zones_geojson(&update.risk_zones),
            update,
            status: CycleStatus::default(),
            alerts: VecDeque::new(),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
pub struct AppState {
    snapshot: watch::Sender<ObserverSnapshot>,
    alerts_tx: broadcast::Sender<EventRecord>,
}

impl AppState {
    /// Create a new application state with empty layers.
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(ObserverSnapshot::default());
        let (alerts_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            snapshot,
            alerts_tx,
        }
    }

    /// Clone the current snapshot.
    pub fn snapshot(&self) -> ObserverSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Run `f` against the current snapshot without cloning it.
    pub fn read<T>(&self, f: impl FnOnce(&ObserverSnapshot) -> T) -> T {
        f(&self.snapshot.borrow())
    }

    /// Watch for snapshot changes.
    pub fn watch(&self) -> watch::Receiver<ObserverSnapshot> {
        self.snapshot.subscribe()
    }

    /// Subscribe to the alert stream.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<EventRecord> {
        self.alerts_tx.subscribe()
    }

    /// Replace both layers with `update`.
    pub fn publish_update(&self, update: &RenderUpdate) {
        let markers = markers_geojson(&update.markers);
        let risk_zones = risk_zones_geojson(&update.risk_zones);
        self.snapshot.send_modify(|snap| {
            snap.update = update.clone();
            snap.markers = markers;
            snap.risk_zones = risk_zones;
            snap.status.updates_applied = snap.status.updates_applied.saturating_add(1);
            snap.status.last_update_at = Some(Utc::now());
        });
    }

    /// Record a new significant event and push it to `WebSocket` clients.
    ///
    /// Returns the number of live subscribers that received it.
    pub fn publish_alert(&self, event: &EventRecord) -> usize {
        self.snapshot.send_modify(|snap| {
            snap.alerts.push_front(event.clone());
            snap.alerts.truncate(MAX_RECENT_ALERTS);
        });
        // send fails only when nobody is subscribed.
        self.alerts_tx.send(event.clone()).unwrap_or(0)
    }

    /// Record a failed refresh cycle.
    pub fn record_failure(&self, message: impl Into<String>) {
        let record = FailureRecord {
            at: Utc::now(),
            message: message.into(),
        };
        self.snapshot.send_modify(|snap| {
            snap.status.failures = snap.status.failures.saturating_add(1);
            snap.status.last_failure = Some(record);
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use quakewatch_types::{EventId, GeoPoint};

    use super::*;

    fn record(id: &str) -> EventRecord {
        EventRecord {
            id: EventId::from(id),
            location: GeoPoint::new(10.0, 20.0),
            magnitude: 6.1,
            place: String::from("Somewhere"),
            observed_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            depth_km: Some(10.0),
        }
    }

    #[test]
    fn empty_state_serves_empty_collections() {
        let state = AppState::new();
        let snap = state.snapshot();
        assert_eq!(snap.markers["type"], "FeatureCollection");
        assert_eq!(snap.markers["features"].as_array().unwrap().len(), 0);
        assert_eq!(snap.risk_zones["features"].as_array().unwrap().len(), 0);
        assert_eq!(snap.status.updates_applied, 0);
    }

    #[test]
    fn alerts_are_newest_first_and_bounded() {
        let state = AppState::new();
        let total = MAX_RECENT_ALERTS.saturating_add(5);
        for i in 0..total {
            state.publish_alert(&record(&format!("ev{i}")));
        }
        let snap = state.snapshot();
        assert_eq!(snap.alerts.len(), MAX_RECENT_ALERTS);
        let newest = format!("ev{}", total.saturating_sub(1));
        assert_eq!(snap.alerts.front().unwrap().id.as_str(), newest);
    }

    #[test]
    fn failures_do_not_touch_layers() {
        let state = AppState::new();
        let mut update = RenderUpdate::default();
        update.new_significant_events.push(record("a"));
        state.publish_update(&update);
        state.record_failure("feed returned HTTP 500");

        let snap = state.snapshot();
        assert_eq!(snap.status.updates_applied, 1);
        assert_eq!(snap.status.failures, 1);
        assert_eq!(snap.update, update);
        assert_eq!(
            snap.status.last_failure.unwrap().message,
            "feed returned HTTP 500"
        );
    }

    #[tokio::test]
    async fn alert_subscribers_receive_events() {
        let state = AppState::new();
        let mut rx = state.subscribe_alerts();
        assert_eq!(state.publish_alert(&record("x")), 1);
        assert_eq!(rx.recv().await.unwrap().id.as_str(), "x");
    }
}
