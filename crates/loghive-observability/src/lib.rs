//! LogHive Observability
//!
//! In-process metrics for the ingestion and query paths, exposed as a
//! snapshot-on-demand JSON map rather than a scrape registry.
//!
//! ## Design
//!
//! Two kinds of state with two kinds of coordination:
//!
//! - **Counters** (`total_ingested`, `total_queries`, `cache_hits`,
//!   `cache_misses`): lock-free `AtomicU64`, incremented on every hot-path
//!   completion.
//! - **Latency reservoirs**: bounded ring buffers of the most recent 1000
//!   duration samples, guarded by a reader/writer lock. Recording takes the
//!   writer lock only for the push; snapshots take the reader lock and copy.
//!
//! Percentiles are computed at snapshot time by sorting a copy of the
//! reservoir. With at most 1000 samples the sort is well under a
//! millisecond, which keeps the hot path free of any histogram bookkeeping.

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot, RESERVOIR_CAPACITY};
