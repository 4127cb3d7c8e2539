//! Observer API server for Quakewatch.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for the latest committed map layers (markers and
//!   risk zones as GeoJSON), the raw render update, recent alerts, and
//!   refresh-cycle status
//! - **`WebSocket` endpoint** (`/ws/alerts`) streaming each new significant
//!   event as it is announced, via [`tokio::sync::broadcast`]
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The refresh loop pushes committed updates into an [`ObserverSink`],
//! which implements both [`RenderSink`] and [`NotificationSink`]. The sink
//! writes into a [`tokio::sync::watch`] snapshot held by [`AppState`];
//! handlers read from that snapshot without ever awaiting the refresh
//! loop.
//!
//! [`RenderSink`]: quakewatch_core::sink::RenderSink
//! [`NotificationSink`]: quakewatch_core::sink::NotificationSink

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sink;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use sink::ObserverSink;
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::{AppState, CycleStatus, FailureRecord, ObserverSnapshot};
