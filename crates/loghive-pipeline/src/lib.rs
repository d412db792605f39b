//! LogHive Ingestion Pipeline
//!
//! Decouples HTTP admission from persistence with a bounded in-memory
//! staging channel and a fixed fleet of batching workers:
//!
//! ```text
//! HTTP handler ──submit──▶ [bounded channel] ──▶ worker 0 ──▶ batch_insert
//!                                           ├─▶ worker 1 ──▶ batch_insert
//!                                           └─▶ worker N ──▶ batch_insert
//! ```
//!
//! Admission never blocks: when the channel is full the caller gets an
//! immediate `ChannelFull` and decides whether to retry. Each worker owns a
//! local batch that is flushed when it reaches `batch_size` or when
//! `batch_timeout` elapses, whichever comes first.
//!
//! The staging channel is volatile. A crash loses staged events, and a
//! failed flush drops its batch after logging. Both are accepted trade-offs
//! for a non-blocking write path; durability starts at the store.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod service;

pub use config::PipelineConfig;
pub use error::{IngestError, PipelineError};
pub use pipeline::IngestionPipeline;
pub use service::IngestionService;
