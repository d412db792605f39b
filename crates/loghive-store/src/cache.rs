//! Query Result Cache Capability
//!
//! The cache stores opaque serialized bytes under content-addressed keys
//! with a per-entry TTL. It is strictly best-effort: entries may be evicted
//! or absent at any time, and every failure mode degrades to "miss".
//!
//! [`MemoryQueryCache`] is the in-process implementation: an LRU map whose
//! entries carry their own expiry, checked on read. It backs tests and
//! cache-enabled deployments without Redis.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Volatile result-cache contract.
#[async_trait]
pub trait QueryCache: Send + Sync {
    /// Store `value` under `key` for at most `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Fetch the value under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Delete every entry whose key starts with `prefix`. Returns the number
    /// of entries removed.
    async fn invalidate(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Cheap liveness probe against the backend.
    async fn health(&self) -> Result<(), CacheError>;
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory LRU cache with per-entry TTL.
pub struct MemoryQueryCache {
    entries: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryQueryCache {
    /// Default capacity, plenty for the distinct-query working set of a
    /// single node.
    const DEFAULT_CAPACITY: usize = 4096;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }
}

impl Default for MemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryCache for MemoryQueryCache {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: value.to_vec(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.put(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut guard = self.entries.write().await;
        match guard.get(key) {
            Some(entry) if entry.is_expired() => {
                guard.pop(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn invalidate(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut guard = self.entries.write().await;
        let keys: Vec<String> = guard
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &keys {
            guard.pop(key);
        }
        Ok(keys.len() as u64)
    }

    async fn health(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
