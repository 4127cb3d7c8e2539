//! Shared type definitions for the Quakewatch seismic risk engine.
//!
//! This crate is the single source of truth for the data model passed
//! between the feed, the planner, and the sinks. Types flow downstream to
//! `TypeScript` via `ts-rs` for the map host.
//!
//! # Modules
//!
//! - [`ids`] -- [`EventId`], the stable upstream event identifier
//! - [`structs`] -- Event records, event sets, risk zones, render updates
//! - [`error`] -- Construction errors for the model types

pub mod error;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use error::EventSetError;
pub use ids::EventId;
pub use structs::{
    EventRecord, EventSet, GeoPoint, Polygon, RenderUpdate, RiskZone, RiskZoneDescriptor,
};
