//! Log Event Model
//!
//! [`LogEvent`] is the unit that flows through the whole system: accepted at
//! the HTTP boundary, staged in the ingestion channel, persisted in batches,
//! and returned from queries.
//!
//! Two timestamps, independent of each other:
//!
//! - `timestamp`: supplied by the client, used for range filtering and
//!   descending retrieval order. Clients may backfill historical events.
//! - `ingested_at`: stamped by the store at persistence time, observability
//!   only. Not guaranteed to be `>= timestamp`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Severity level of a log event. The set is closed and case-sensitive:
/// only the exact uppercase forms are accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "INFO")]
    Info,
}

impl Severity {
    /// All levels, highest first.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    /// Whether `s` is one of the enumerated levels (exact case).
    pub fn is_valid(s: &str) -> bool {
        Severity::from_str(s).is_ok()
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRITICAL" => Ok(Severity::Critical),
            "HIGH" => Ok(Severity::High),
            "MEDIUM" => Ok(Severity::Medium),
            "LOW" => Ok(Severity::Low),
            "INFO" => Ok(Severity::Info),
            other => Err(ValidationError::InvalidSeverity(other.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Unique identifier, assigned by the ingestion service, never by the
    /// client.
    pub id: Uuid,

    /// Client-supplied event time. Query filtering and ordering key.
    pub timestamp: DateTime<Utc>,

    pub severity: Severity,

    /// Originating host/application. Opaque, 1..=255 characters.
    pub source: String,

    /// Event payload. Opaque, 1..=4096 characters.
    pub message: String,

    /// Stamped by the store when the event is persisted. `None` while the
    /// event is still staged in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<DateTime<Utc>>,
}

impl LogEvent {
    /// Build a new event with a freshly assigned id.
    pub fn new(
        timestamp: DateTime<Utc>,
        severity: Severity,
        source: String,
        message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            severity,
            source,
            message,
            ingested_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_roundtrip() {
        for sev in Severity::ALL {
            assert_eq!(Severity::from_str(sev.as_str()).unwrap(), sev);
        }
    }

    #[test]
    fn severity_is_case_sensitive() {
        assert!(Severity::is_valid("HIGH"));
        assert!(!Severity::is_valid("high"));
        assert!(!Severity::is_valid("High"));
        assert!(!Severity::is_valid(""));
        assert!(!Severity::is_valid("SEVERE"));
    }

    #[test]
    fn severity_serializes_to_uppercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");

        let parsed: Severity = serde_json::from_str("\"INFO\"").unwrap();
        assert_eq!(parsed, Severity::Info);

        assert!(serde_json::from_str::<Severity>("\"info\"").is_err());
    }

    #[test]
    fn new_event_assigns_unique_ids() {
        let a = LogEvent::new(Utc::now(), Severity::Low, "a".into(), "x".into());
        let b = LogEvent::new(Utc::now(), Severity::Low, "a".into(), "x".into());
        assert_ne!(a.id, b.id);
        assert!(a.ingested_at.is_none());
    }

    #[test]
    fn event_json_omits_missing_ingested_at() {
        let event = LogEvent::new(Utc::now(), Severity::High, "host".into(), "msg".into());
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("ingested_at").is_none());
        assert_eq!(json["severity"], "HIGH");
    }
}
