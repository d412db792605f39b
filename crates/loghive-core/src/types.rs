//! Boundary Transfer Shapes
//!
//! Request and response bodies exchanged over HTTP. All fields use
//! `#[serde(default)]` on inbound shapes so that a structurally valid JSON
//! document with missing fields reaches the validator (which reports a
//! precise error) instead of failing generic deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::LogEvent;

/// Single-event ingest request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub message: String,
}

/// Batch ingest request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchIngestRequest {
    #[serde(default)]
    pub logs: Vec<IngestRequest>,
}

/// Response to a successful single ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub id: Uuid,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-item failure inside a batch ingest response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemError {
    /// Decimal index of the failed entry within the submitted batch,
    /// rendered as text.
    pub index: String,
    pub error: String,
    pub log_id: String,
}

/// Response to a batch ingest. Partial success is expected: accepted and
/// rejected counts always sum to the submitted batch size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchIngestResponse {
    pub accepted: usize,
    pub rejected: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchItemError>,
}

/// Raw query parameters as received from the client, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Severity filter; empty means all levels.
    #[serde(default)]
    pub severity: Vec<String>,
    /// Exact-match source filter.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// A validated, normalized query. Produced only by
/// [`crate::validate::validate_query`]; the range endpoints are guaranteed
/// present and ordered, the limit is in `1..=1000`, the offset non-negative,
/// and every severity is a member of the enumerated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub severities: Vec<String>,
    pub source: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Query result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Unpaginated match count.
    pub total: i64,
    /// Number of events in this page; always `logs.len()`.
    pub count: usize,
    pub logs: Vec<LogEvent>,
}

impl QueryResponse {
    pub fn new(total: i64, logs: Vec<LogEvent>) -> Self {
        Self {
            total,
            count: logs.len(),
            logs,
        }
    }
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code.
    pub error: String,
    /// Human-readable description.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_request_tolerates_missing_fields() {
        let req: IngestRequest = serde_json::from_str("{}").unwrap();
        assert!(req.timestamp.is_none());
        assert!(req.severity.is_empty());
    }

    #[test]
    fn batch_response_omits_empty_errors() {
        let resp = BatchIngestResponse {
            accepted: 3,
            rejected: 0,
            errors: vec![],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn query_response_count_tracks_logs() {
        let resp = QueryResponse::new(42, vec![]);
        assert_eq!(resp.total, 42);
        assert_eq!(resp.count, 0);
    }

    #[test]
    fn error_response_details_are_optional() {
        let err = ErrorResponse::new("validation_failed", "bad input");
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("details").is_none());

        let err = ErrorResponse::new("validation_failed", "bad input")
            .with_details(serde_json::json!({"log_index": 3}));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["details"]["log_index"], 3);
    }
}
