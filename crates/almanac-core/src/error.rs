//! Error types for the calendar core.

use thiserror::Error;

use crate::event::EventId;

/// Errors surfaced by the store, the form layer and config loading.
///
/// Layout never produces one of these: an unmeasurable cell degrades to
/// an empty cell and a log line instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("event not found: {0}")]
    EventNotFound(EventId),

    #[error("event id already in use: {0}")]
    DuplicateId(EventId),

    #[error("invalid time '{0}': expected HH:MM (24h)")]
    InvalidTime(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type CalendarResult<T> = Result<T, CalendarError>;
