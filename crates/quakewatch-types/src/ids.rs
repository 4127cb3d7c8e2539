//! Type-safe identifier for seismic events.
//!
//! Upstream feeds assign each event an opaque string identifier (USGS uses
//! network-prefixed codes such as `us7000abcd`). The identifier is stable
//! across fetches for the same physical event, so it is the only key the
//! diff engine uses to decide whether an event is new.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for a seismic event, as assigned by the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct EventId(pub String);

impl EventId {
    /// Create an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
