//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled so a browser map can fetch the layers.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- liveness probe
/// - `GET /ws/alerts` -- `WebSocket` alert stream
/// - `GET /api/markers` -- marker layer
/// - `GET /api/risk-zones` -- risk-zone layer
/// - `GET /api/update` -- latest render update
/// - `GET /api/events` -- current events
/// - `GET /api/events/:id` -- single event
/// - `GET /api/alerts` -- recent alerts
/// - `GET /api/status` -- refresh status
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/ws/alerts", get(ws::ws_alerts))
        .route("/api/markers", get(handlers::get_markers))
        .route("/api/risk-zones", get(handlers::get_risk_zones))
        .route("/api/update", get(handlers::get_update))
        .route("/api/events", get(handlers::list_events))
        .route("/api/events/{id}", get(handlers::get_event))
        .route("/api/alerts", get(handlers::list_alerts))
        .route("/api/status", get(handlers::get_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
