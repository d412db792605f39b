//! LogHive Storage Layer
//!
//! Capability contracts over persistent log storage and the volatile query
//! result cache, together with the cache-aware query engine.
//!
//! ## Components
//!
//! - [`LogStore`]: persistence contract. Implemented by
//!   [`PostgresLogStore`] (production, sqlx connection pool) and
//!   [`MemoryLogStore`] (tests and local development).
//! - [`QueryCache`]: result-cache contract. Implemented by
//!   [`RedisQueryCache`] (production) and [`MemoryQueryCache`] (LRU with
//!   per-entry TTL).
//! - [`QueryEngine`]: the read path. Looks up a content-addressed cache key,
//!   falls back to the store, repopulates the cache, and reports hit/miss
//!   plus latency to the metrics collector.
//!
//! ## Consistency
//!
//! The cache is best-effort and eventually consistent: a freshly ingested
//! event may not appear in cached results until the entry's TTL expires.
//! Nothing on the write path invalidates cache entries; correctness never
//! depends on a cache hit.

pub mod cache;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod redis;

pub use cache::{CacheError, MemoryQueryCache, QueryCache};
pub use error::{Result, StoreError};
pub use memory::MemoryLogStore;
pub use postgres::PostgresLogStore;
pub use query::{cache_key, fingerprint, QueryEngine};
pub use self::redis::RedisQueryCache;

use async_trait::async_trait;
use loghive_core::{LogEvent, LogQuery};
use uuid::Uuid;

/// Persistence contract for log events.
///
/// Implementations must be safe to share across tasks via
/// `Arc<dyn LogStore>`; connection management is the implementation's
/// concern and must release resources on every exit path, including
/// cancellation.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist a single event. The store stamps `ingested_at`.
    async fn insert(&self, event: &LogEvent) -> Result<()>;

    /// Persist a batch atomically: if any row fails, no row from the batch
    /// becomes visible.
    async fn batch_insert(&self, events: &[LogEvent]) -> Result<()>;

    /// Fetch events matching the query, newest first, paginated. Returns
    /// the page and the unpaginated match count.
    async fn query(&self, query: &LogQuery) -> Result<(Vec<LogEvent>, i64)>;

    /// Look up a single event by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<LogEvent>>;

    /// Cheap liveness probe against the backend.
    async fn health(&self) -> Result<()>;
}
