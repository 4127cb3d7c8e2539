//! Event diffing, proximity clustering, and cycle planning for Quakewatch.
//!
//! This crate turns successive snapshots of a seismic event feed into
//! render updates: full marker and risk-zone layers plus the list of
//! significant events that are new since the previous snapshot.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `quakewatch.yaml` into
//!   strongly-typed structs.
//! - [`diff`] -- New-significant-event detection between two snapshots.
//! - [`cluster`] -- Pairwise proximity clustering with pluggable
//!   [`CandidatePairs`] strategies.
//! - [`planner`] -- [`UpdatePlanner`], the stateful per-feed orchestrator.
//! - [`geojson`] -- GeoJSON projection of render layers.
//! - [`sink`] -- [`RenderSink`] and [`NotificationSink`] traits with file and
//!   log implementations.
//!
//! [`CandidatePairs`]: cluster::CandidatePairs
//! [`UpdatePlanner`]: planner::UpdatePlanner
//! [`RenderSink`]: sink::RenderSink
//! [`NotificationSink`]: sink::NotificationSink

pub mod cluster;
pub mod config;
pub mod diff;
pub mod geojson;
pub mod planner;
pub mod sink;

pub use cluster::{
    AllPairs, CandidatePairs, ClusterError, LatitudeBands, PairStrategy, cluster, cluster_with,
};
pub use config::{ConfigError, QuakewatchConfig};
pub use diff::diff_new_significant;
pub use planner::{CycleStage, DegenerateZonePolicy, PlannerError, StageError, UpdatePlanner};
pub use sink::{NotificationSink, RenderSink, SinkError};
