//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the [`ObserverSnapshot`](crate::state::ObserverSnapshot)
//! via the shared [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/markers` | Marker layer (GeoJSON) |
//! | `GET` | `/api/risk-zones` | Risk-zone layer (GeoJSON) |
//! | `GET` | `/api/update` | Latest render update as received |
//! | `GET` | `/api/events` | Current events (optional magnitude filter) |
//! | `GET` | `/api/events/:id` | Single current event |
//! | `GET` | `/api/alerts` | Recent new-significant-event alerts |
//! | `GET` | `/api/status` | Refresh-cycle status |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use quakewatch_types::{EventId, EventRecord};

use crate::error::ObserverError;
use crate::state::{AppState, MAX_RECENT_ALERTS};

/// Default number of alerts returned by `GET /api/alerts`.
const DEFAULT_ALERT_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/events` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Only return events at or above this magnitude.
    pub min_magnitude: Option<f64>,
}

/// Query parameters for the `GET /api/alerts` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct AlertsQuery {
    /// Maximum number of alerts to return.
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing layer sizes and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (events, zones, alerts, updates, failures) = state.read(|snap| {
        (
            snap.update.markers.len(),
            snap.update.risk_zones.len(),
            snap.alerts.len(),
            snap.status.updates_applied,
            snap.status.failures,
        )
    });

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Quakewatch Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #f0883e; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #f0883e; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Quakewatch Observer</h1>
    <p class="subtitle">Significant earthquakes and proximity risk zones</p>

    <div>
        <div class="metric"><div class="label">Events</div><div class="value">{events}</div></div>
        <div class="metric"><div class="label">Risk zones</div><div class="value">{zones}</div></div>
        <div class="metric"><div class="label">Alerts</div><div class="value">{alerts}</div></div>
        <div class="metric"><div class="label">Updates</div><div class="value">{updates}</div></div>
        <div class="metric"><div class="label">Failures</div><div class="value">{failures}</div></div>
    </div>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/markers">/api/markers</a> -- Marker layer (GeoJSON)</li>
        <li><a href="/api/risk-zones">/api/risk-zones</a> -- Risk-zone layer (GeoJSON)</li>
        <li><a href="/api/update">/api/update</a> -- Latest render update</li>
        <li><a href="/api/events">/api/events</a> -- Current events (?min_magnitude=X)</li>
        <li><a href="/api/alerts">/api/alerts</a> -- Recent alerts (?limit=N)</li>
        <li><a href="/api/status">/api/status</a> -- Refresh status</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/alerts</code> -- Live alert stream</li>
    </ul>
</body>
</html>"#
    ))
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// Return the marker layer as a GeoJSON `FeatureCollection`.
pub async fn get_markers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.read(|snap| snap.markers.clone()))
}

/// Return the risk-zone layer as a GeoJSON `FeatureCollection`.
pub async fn get_risk_zones(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.read(|snap| snap.risk_zones.clone()))
}

/// Return the latest render update exactly as the planner produced it.
pub async fn get_update(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let body = state.read(|snap| serde_json::to_value(&snap.update))?;
    Ok(Json(body))
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// List events in the current set, optionally filtered by magnitude.
///
/// # Query Parameters
///
/// - `min_magnitude`: finite, non-negative magnitude floor.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let floor = match params.min_magnitude {
        Some(m) if !m.is_finite() || m < 0.0 => {
            return Err(ObserverError::InvalidQuery(format!(
                "min_magnitude must be a non-negative number, got {m}"
            )));
        }
        Some(m) => m,
        None => f64::NEG_INFINITY,
    };

    let events: Vec<EventRecord> = state.read(|snap| {
        snap.update
            .markers
            .iter()
            .filter(|e| e.magnitude >= floor)
            .cloned()
            .collect()
    });

    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

/// Return a single event from the current set.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = EventId::new(id);
    let event = state
        .read(|snap| snap.update.markers.get(&id).cloned())
        .ok_or_else(|| ObserverError::NotFound(format!("event {id}")))?;
    Ok(Json(serde_json::to_value(event)?))
}

// ---------------------------------------------------------------------------
// Alerts and status
// ---------------------------------------------------------------------------

/// Return recent alerts, newest first.
///
/// # Query Parameters
///
/// - `limit`: maximum number of alerts (default 20, must be at least 1).
pub async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let limit = match params.limit {
        Some(0) => {
            return Err(ObserverError::InvalidQuery(String::from(
                "limit must be at least 1",
            )));
        }
        Some(n) => n.min(MAX_RECENT_ALERTS),
        None => DEFAULT_ALERT_LIMIT,
    };

    let alerts: Vec<serde_json::Value> = state.read(|snap| {
        snap.alerts
            .iter()
            .take(limit)
            .map(|e| {
                serde_json::json!({
                    "title": e.alert_title(),
                    "summary": e.summary(),
                    "event": e,
                })
            })
            .collect()
    });

    Ok(Json(serde_json::json!({
        "count": alerts.len(),
        "alerts": alerts,
    })))
}

/// Return refresh-cycle status.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let body = state.read(|snap| {
        serde_json::to_value(&snap.status).map(|mut status| {
            if let Some(obj) = status.as_object_mut() {
                obj.insert("events".to_owned(), snap.update.markers.len().into());
                obj.insert("risk_zones".to_owned(), snap.update.risk_zones.len().into());
            }
            status
        })
    })?;
    Ok(Json(body))
}
