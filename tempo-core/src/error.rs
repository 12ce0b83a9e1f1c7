//! Error types for the scheduling engine.

use thiserror::Error;

/// Errors that can occur in scheduling operations.
///
/// Everything here is recoverable by the caller: an event failing to
/// expand or move is reported as a value, never a panic.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid recurrence rule on event '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("Event '{id}' is locked")]
    LockedEvent { id: String },

    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}

/// Result type alias for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
