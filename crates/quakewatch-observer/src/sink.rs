//! Render and notification sink backed by the observer state.

use std::sync::Arc;

use quakewatch_core::sink::{NotificationSink, RenderSink, SinkError};
use quakewatch_types::{EventRecord, RenderUpdate};
use tracing::debug;

use crate::state::AppState;

/// Feeds committed cycles into the observer's [`AppState`].
///
/// Cloning is cheap; the refresh loop registers one clone as a render
/// sink and another as a notification sink.
#[derive(Clone)]
pub struct ObserverSink {
    state: Arc<AppState>,
}

impl ObserverSink {
    /// Create a sink writing into `state`.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl RenderSink for ObserverSink {
    fn name(&self) -> &'static str {
        "observer"
    }

    fn apply(&mut self, update: &RenderUpdate) -> Result<(), SinkError> {
        self.state.publish_update(update);
        Ok(())
    }
}

impl NotificationSink for ObserverSink {
    fn name(&self) -> &'static str {
        "observer"
    }

    fn notify(&mut self, event: &EventRecord) -> Result<(), SinkError> {
        let receivers = self.state.publish_alert(event);
        debug!(event_id = %event.id, receivers, "Alert published");
        Ok(())
    }
}
