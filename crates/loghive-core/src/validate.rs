//! Request Validation
//!
//! Pure, stateless checks applied before a request is admitted to the
//! ingestion pipeline or the query engine. Field limits:
//!
//! | Field | Constraint |
//! |-------|------------|
//! | `timestamp` | present and RFC 3339 parseable |
//! | `severity` | member of the enumerated set, exact case |
//! | `source` | 1..=255 characters |
//! | `message` | 1..=4096 characters |
//! | `limit` | defaulted to 100 when `<= 0`, rejected above 1000 |
//! | `offset` | non-negative |
//!
//! Length limits count Unicode scalar values, not bytes.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::event::Severity;
use crate::types::{IngestRequest, LogQuery, QueryRequest};
use crate::{DEFAULT_QUERY_LIMIT, MAX_MESSAGE_LEN, MAX_QUERY_LIMIT, MAX_SOURCE_LEN};

/// Validate a single ingest request.
///
/// Returns the first violated constraint; callers surface the error code to
/// the client unchanged.
pub fn validate_ingest(req: &IngestRequest) -> Result<(), ValidationError> {
    if req.timestamp.is_none() {
        return Err(ValidationError::InvalidTimestamp);
    }

    if !Severity::is_valid(&req.severity) {
        return Err(ValidationError::InvalidSeverity(req.severity.clone()));
    }

    if req.source.is_empty() {
        return Err(ValidationError::EmptySource);
    }
    let source_len = req.source.chars().count();
    if source_len > MAX_SOURCE_LEN {
        return Err(ValidationError::SourceTooLong(source_len));
    }

    if req.message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    let message_len = req.message.chars().count();
    if message_len > MAX_MESSAGE_LEN {
        return Err(ValidationError::MessageTooLong(message_len));
    }

    Ok(())
}

/// Validate a query request and normalize it into a [`LogQuery`].
///
/// The only mutation performed is substituting the default limit when the
/// client sent `limit <= 0`; every other field is passed through verbatim.
pub fn validate_query(req: &QueryRequest) -> Result<LogQuery, ValidationError> {
    let (start_time, end_time) = match (req.start_time, req.end_time) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(ValidationError::MissingRange),
    };

    if end_time < start_time {
        return Err(ValidationError::InvalidRange);
    }

    for sev in &req.severity {
        if !Severity::is_valid(sev) {
            return Err(ValidationError::InvalidSeverity(sev.clone()));
        }
    }

    let limit = if req.limit <= 0 {
        DEFAULT_QUERY_LIMIT
    } else {
        req.limit
    };
    if limit > MAX_QUERY_LIMIT {
        return Err(ValidationError::LimitTooLarge(limit));
    }

    if req.offset < 0 {
        return Err(ValidationError::NegativeOffset(req.offset));
    }

    Ok(LogQuery {
        start_time,
        end_time,
        severities: req.severity.clone(),
        source: req.source.clone(),
        limit,
        offset: req.offset,
    })
}

/// Parse an RFC 3339 / ISO 8601 timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::InvalidTimestamp);
    }

    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidTimestamp)
}
