//! Diff engine: which events arrived since the last committed fetch.
//!
//! Identity is the upstream [`EventId`](quakewatch_types::EventId) only.
//! Revised attributes on a known id never make an event "new" again.

use quakewatch_types::{EventRecord, EventSet};

/// Events in `current` whose id is absent from `previous` and whose
/// magnitude is at least `min_magnitude`, in `current` order.
///
/// With no previous set (the first cycle) nothing is new, so startup never
/// floods the notification sink.
pub fn diff_new_significant(
    previous: Option<&EventSet>,
    current: &EventSet,
    min_magnitude: f64,
) -> Vec<EventRecord> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    let known = previous.ids();
    current
        .iter()
        .filter(|event| !known.contains(&event.id) && event.magnitude >= min_magnitude)
        .cloned()
        .collect()
}
