//! Error types for constructing shared model values.

use crate::ids::EventId;

/// Errors raised when assembling an [`EventSet`](crate::EventSet).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventSetError {
    /// Two records in the same set share an identifier.
    #[error("duplicate event id in set: {0}")]
    DuplicateEvent(EventId),
}
