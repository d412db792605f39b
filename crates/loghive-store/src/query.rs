//! Cache-Aware Query Engine
//!
//! The read path for log queries:
//!
//! 1. Derive a content-addressed cache key from the validated query.
//! 2. Look the key up in the result cache. A hit returns the deserialized
//!    response immediately; any cache failure is logged and treated as a
//!    miss.
//! 3. On miss, run the store query and build the response.
//! 4. Best-effort write the response back to the cache with the configured
//!    TTL. Write failures are logged, never surfaced.
//!
//! Every query reports its end-to-end latency and hit/miss outcome to the
//! metrics collector. Nothing here invalidates cache entries on ingest:
//! results may be stale for up to the TTL, a deliberate trade of freshness
//! for throughput.

use std::sync::Arc;
use std::time::{Duration, Instant};

use loghive_core::{LogQuery, QueryResponse};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use loghive_observability::MetricsCollector;

use crate::cache::QueryCache;
use crate::error::Result;
use crate::LogStore;

/// Key namespace shared by all cached query results; `invalidate` with this
/// prefix clears the whole result cache.
pub const CACHE_KEY_PREFIX: &str = "logs:query:";

/// Canonical text form of a query, total and stable across processes.
///
/// Field order is fixed: start, end, severity list, source, limit, offset.
/// Two queries produce the same fingerprint exactly when those components
/// are equal (severities compared as an ordered list, range endpoints at
/// second precision).
pub fn fingerprint(query: &LogQuery) -> String {
    format!(
        "{}|{}|{:?}|{:?}|{}|{}",
        query.start_time.timestamp(),
        query.end_time.timestamp(),
        query.severities,
        query.source,
        query.limit,
        query.offset,
    )
}

/// Cache key for a query: the namespace prefix plus the hex SHA-256 of the
/// fingerprint.
pub fn cache_key(query: &LogQuery) -> String {
    let digest = Sha256::digest(fingerprint(query).as_bytes());
    format!("{}{:x}", CACHE_KEY_PREFIX, digest)
}

/// Cache-aware read path over a [`LogStore`] and a [`QueryCache`].
pub struct QueryEngine {
    store: Arc<dyn LogStore>,
    cache: Arc<dyn QueryCache>,
    metrics: Arc<MetricsCollector>,
    cache_enabled: bool,
    cache_ttl: Duration,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn LogStore>,
        cache: Arc<dyn QueryCache>,
        metrics: Arc<MetricsCollector>,
        cache_enabled: bool,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
            cache_enabled,
            cache_ttl,
        }
    }

    /// Execute a validated query.
    pub async fn query(&self, query: &LogQuery) -> Result<QueryResponse> {
        let started = Instant::now();

        let key = if self.cache_enabled {
            let key = cache_key(query);
            if let Some(response) = self.cache_lookup(&key).await {
                self.metrics.record_query(started.elapsed(), true);
                return Ok(response);
            }
            Some(key)
        } else {
            None
        };

        let (logs, total) = match self.store.query(query).await {
            Ok(result) => result,
            Err(e) => {
                self.metrics.record_query(started.elapsed(), false);
                return Err(e);
            }
        };
        let response = QueryResponse::new(total, logs);

        if let Some(key) = key {
            self.cache_store(&key, &response).await;
        }

        self.metrics.record_query(started.elapsed(), false);
        Ok(response)
    }

    async fn cache_lookup(&self, key: &str) -> Option<QueryResponse> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(response) => {
                    debug!(key, "query cache hit");
                    Some(response)
                }
                Err(e) => {
                    warn!(key, error = %e, "discarding undecodable cached result");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "query cache read failed");
                None
            }
        }
    }

    async fn cache_store(&self, key: &str, response: &QueryResponse) {
        match serde_json::to_vec(response) {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(key, &bytes, self.cache_ttl).await {
                    warn!(key, error = %e, "query cache write failed");
                }
            }
            Err(e) => warn!(key, error = %e, "failed to serialize query response for cache"),
        }
    }
}
