//! Refresh loop and process wiring for the Quakewatch binary.
//!
//! The binary loads [`QuakewatchConfig`](quakewatch_core::config::QuakewatchConfig),
//! initializes tracing, starts the observer, and hands a [`Refresher`] the
//! feed source, planner and sinks. The library half exists so the loop can
//! be driven from tests.
//!
//! # Modules
//!
//! - [`error`] -- [`RefreshError`], startup failures.
//! - [`logging`] -- `tracing-subscriber` initialization.
//! - [`settings`] -- Config file discovery.
//! - [`refresh`] -- [`Refresher`], the periodic fetch/plan/deliver loop.

pub mod error;
pub mod logging;
pub mod refresh;
pub mod settings;

pub use error::RefreshError;
pub use refresh::{CycleOutcome, RefreshSummary, Refresher};
