//! Seismic event feed retrieval for Quakewatch.
//!
//! The feed is the planner's only input. This crate fetches a GeoJSON
//! `FeatureCollection` (over HTTP from the USGS FDSN event service, or from
//! a replay file), validates it, and hands back an
//! [`EventSet`](quakewatch_types::EventSet). Any failure is a
//! [`FeedError`]; the caller reports it to the planner as a fetch failure.
//!
//! # Modules
//!
//! - [`error`] -- [`FeedError`].
//! - [`parse`] -- GeoJSON to `EventSet` conversion.
//! - [`source`] -- [`FeedSource`] enum dispatch over HTTP and file sources.

pub mod error;
pub mod parse;
pub mod source;

pub use error::FeedError;
pub use parse::parse_feature_collection;
pub use source::{FeedSource, FileFeed, UsgsFeed};
