//! Render and notification sinks.
//!
//! Sinks receive the output of a committed cycle. They run after the
//! planner has already committed, so a failing sink never affects planner
//! state; [`deliver`] logs each failure and moves on to the next sink.

use std::path::{Path, PathBuf};

use quakewatch_types::{EventRecord, RenderUpdate};
use tracing::{info, warn};

use crate::geojson::{markers_geojson, risk_zones_geojson};

/// File name of the marker layer written by [`GeoJsonFileSink`].
pub const MARKERS_FILE: &str = "quake-points.geojson";

/// File name of the risk-zone layer written by [`GeoJsonFileSink`].
pub const RISK_ZONES_FILE: &str = "risk-area.geojson";

/// Errors that can occur while delivering an update.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Writing a layer file failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A layer could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink cannot accept updates right now.
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Consumer of full layer replacements.
pub trait RenderSink: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Replace the sink's marker and risk-zone layers with `update`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the layers could not be applied.
    fn apply(&mut self, update: &RenderUpdate) -> Result<(), SinkError>;
}

/// Consumer of newly arrived significant events.
pub trait NotificationSink: Send {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// Present one new significant event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the notification could not be delivered.
    fn notify(&mut self, event: &EventRecord) -> Result<(), SinkError>;
}

/// Apply `update` to every render sink and announce each new significant
/// event to every notification sink.
///
/// Returns the number of failed deliveries.
pub fn deliver(
    update: &RenderUpdate,
    renderers: &mut [Box<dyn RenderSink>],
    notifiers: &mut [Box<dyn NotificationSink>],
) -> usize {
    let mut failures: usize = 0;

    for sink in renderers.iter_mut() {
        if let Err(e) = sink.apply(update) {
            warn!(sink = sink.name(), error = %e, "Render sink failed");
            failures = failures.saturating_add(1);
        }
    }

    for event in &update.new_significant_events {
        for sink in notifiers.iter_mut() {
            if let Err(e) = sink.notify(event) {
                warn!(sink = sink.name(), event_id = %event.id, error = %e, "Notification failed");
                failures = failures.saturating_add(1);
            }
        }
    }

    failures
}

/// Announces new events through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn notify(&mut self, event: &EventRecord) -> Result<(), SinkError> {
        info!(
            event_id = %event.id,
            magnitude = event.magnitude,
            lon = event.location.lon,
            lat = event.location.lat,
            place = %event.place,
            "{}",
            event.alert_title()
        );
        Ok(())
    }
}

/// Writes the two layers as GeoJSON files, replacing them on every update.
///
/// Both layers are staged as temporary siblings before either is renamed
/// into place, so a failed write leaves the previous pair of files intact.
#[derive(Debug, Clone)]
pub struct GeoJsonFileSink {
    dir: PathBuf,
}

impl GeoJsonFileSink {
    /// Create a sink writing into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| SinkError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{name}.tmp"))
    }

    fn stage(&self, name: &str, value: &serde_json::Value) -> Result<PathBuf, SinkError> {
        let staging = self.staging_path(name);
        let bytes = serde_json::to_vec(value)?;
        std::fs::write(&staging, bytes).map_err(|source| SinkError::Io {
            path: staging.clone(),
            source,
        })?;
        Ok(staging)
    }

    fn commit(&self, staging: &Path, name: &str) -> Result<(), SinkError> {
        let target = self.dir.join(name);
        std::fs::rename(staging, &target).map_err(|source| SinkError::Io {
            path: target.clone(),
            source,
        })
    }
}

impl RenderSink for GeoJsonFileSink {
    fn name(&self) -> &'static str {
        "geojson-file"
    }

    fn apply(&mut self, update: &RenderUpdate) -> Result<(), SinkError> {
        let markers = self.stage(MARKERS_FILE, &markers_geojson(&update.markers))?;
        let zones = match self.stage(RISK_ZONES_FILE, &risk_zones_geojson(&update.risk_zones)) {
            Ok(path) => path,
            Err(e) => {
                // Best effort; the stale temp file is overwritten next cycle.
                let _ = std::fs::remove_file(&markers);
                return Err(e);
            }
        };
        self.commit(&markers, MARKERS_FILE)?;
        self.commit(&zones, RISK_ZONES_FILE)
    }
}
