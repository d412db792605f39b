//! Validation Error Types
//!
//! All validator failures carry a stable machine-readable code that is
//! surfaced verbatim in HTTP error responses, so clients can branch on
//! `error` without parsing the human-readable message.

use thiserror::Error;

/// A request failed validation.
///
/// Each variant maps to exactly one wire code (see [`ValidationError::code`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timestamp is missing or unparseable")]
    InvalidTimestamp,

    #[error("invalid severity level: {0}")]
    InvalidSeverity(String),

    #[error("source cannot be empty")]
    EmptySource,

    #[error("source exceeds 255 characters (got {0})")]
    SourceTooLong(usize),

    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("message exceeds 4096 characters (got {0})")]
    MessageTooLong(usize),

    #[error("start_time and end_time are required")]
    MissingRange,

    #[error("end_time must not be before start_time")]
    InvalidRange,

    #[error("limit cannot exceed 1000 (got {0})")]
    LimitTooLarge(i64),

    #[error("offset cannot be negative (got {0})")]
    NegativeOffset(i64),
}

impl ValidationError {
    /// Stable wire code for the `error` field of an error response.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidSeverity(_) => "invalid_severity",
            Self::EmptySource => "empty_source",
            Self::SourceTooLong(_) => "source_too_long",
            Self::EmptyMessage => "empty_message",
            Self::MessageTooLong(_) => "message_too_long",
            Self::MissingRange => "missing_range",
            Self::InvalidRange => "invalid_range",
            Self::LimitTooLarge(_) => "limit_too_large",
            Self::NegativeOffset(_) => "negative_offset",
        }
    }
}
