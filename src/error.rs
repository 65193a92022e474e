//! Error types for EventHub domain operations.

use crate::store::StoreError;
use crate::types::{EventId, GuestId};
use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, EventHubError>;

/// Error taxonomy for the EventHub domain services.
///
/// `CapacityExceeded` and `WaitlistEmpty` are expected business outcomes,
/// not faults: callers surface them to users as-is and never retry them.
/// `StoreTimeout` means a round trip to the backing store timed out with the
/// outcome unknown; it must never be treated as "the write did not happen".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventHubError {
    /// Bad input (empty name/email, unknown action type, ...). No retry.
    #[error("{0}")]
    Validation(String),

    /// The event has no seats left. Expected outcome, surfaced as-is.
    ///
    /// The display string is part of the waitlist function contract.
    #[error("Event is still at capacity")]
    CapacityExceeded,

    /// No unpromoted entries remain on the waitlist. Expected outcome.
    ///
    /// The display string is part of the waitlist function contract.
    #[error("No one on waitlist")]
    WaitlistEmpty,

    /// Referenced event does not exist.
    #[error("Event {0} not found")]
    EventNotFound(EventId),

    /// Referenced guest does not exist.
    #[error("Guest {0} not found")]
    GuestNotFound(GuestId),

    /// Referenced conversation does not exist.
    #[error("Conversation not found")]
    ConversationNotFound,

    /// A store round trip timed out. The outcome of the operation is
    /// unknown; the caller must not assume failure and must not blindly
    /// retry mutations.
    #[error("Store operation timed out; outcome unknown")]
    StoreTimeout,

    /// Optimistic-concurrency retries were exhausted. Safe to retry the
    /// whole request later.
    #[error("Concurrent updates kept interfering; try again")]
    Contention,

    /// Any other failure talking to the backing store.
    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for EventHubError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => Self::StoreTimeout,
            StoreError::Conflict => Self::Contention,
            StoreError::NotFound => Self::Store("row not found".to_string()),
            StoreError::Database(message) => Self::Store(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_outcomes_display_wire_messages() {
        assert_eq!(
            EventHubError::CapacityExceeded.to_string(),
            "Event is still at capacity"
        );
        assert_eq!(EventHubError::WaitlistEmpty.to_string(), "No one on waitlist");
    }

    #[test]
    fn store_timeout_is_distinct_from_business_outcomes() {
        let err: EventHubError = StoreError::Timeout.into();
        assert_eq!(err, EventHubError::StoreTimeout);
        assert_ne!(err, EventHubError::CapacityExceeded);
    }
}
