//! LogHive Core Types
//!
//! Shared domain model for the LogHive ingestion and query service.
//!
//! This crate is deliberately small and dependency-light. It defines:
//!
//! - [`LogEvent`]: the unit of ingestion and retrieval
//! - [`Severity`]: the closed set of severity levels
//! - Transfer shapes exchanged at the HTTP boundary ([`IngestRequest`],
//!   [`QueryRequest`], [`QueryResponse`], ...)
//! - The pure request validator ([`validate_ingest`], [`validate_query`],
//!   [`parse_timestamp`])
//!
//! Everything else in the system (storage, pipeline, API) depends on this
//! crate; it depends on nothing but serde/chrono/uuid.

pub mod error;
pub mod event;
pub mod types;
pub mod validate;

pub use error::ValidationError;
pub use event::{LogEvent, Severity};
pub use types::{
    BatchIngestRequest, BatchIngestResponse, BatchItemError, ErrorResponse, IngestRequest,
    IngestResponse, LogQuery, QueryRequest, QueryResponse,
};
pub use validate::{parse_timestamp, validate_ingest, validate_query};

/// Maximum length of the `source` field in characters.
pub const MAX_SOURCE_LEN: usize = 255;

/// Maximum length of the `message` field in characters.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Maximum page size a query may request.
pub const MAX_QUERY_LIMIT: i64 = 1000;

/// Page size substituted when a query does not specify one.
pub const DEFAULT_QUERY_LIMIT: i64 = 100;
