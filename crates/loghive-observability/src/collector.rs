//! Metrics Collector
//!
//! Tracks throughput counters and latency reservoirs for the ingestion and
//! query paths. Shared across services via `Arc<MetricsCollector>`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Number of latency samples kept per path. When a reservoir is full the
/// oldest sample is evicted on insert.
pub const RESERVOIR_CAPACITY: usize = 1000;

/// Point-in-time view of all collected metrics, serialized directly as the
/// metrics endpoint's response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Ingestion operations per second since startup.
    pub ingestion_rate: f64,
    pub total_logs_ingested: u64,
    pub total_queries: u64,
    pub avg_ingestion_latency_ms: f64,
    pub p95_ingestion_latency_ms: u64,
    pub p99_ingestion_latency_ms: u64,
    pub avg_query_latency_ms: f64,
    pub p95_query_latency_ms: u64,
    /// `hits / (hits + misses)`, 0 when nothing has been observed.
    pub cache_hit_ratio: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub uptime_seconds: f64,
}

/// Collects ingestion/query throughput and latency metrics.
///
/// Counters are lock-free atomics; the latency reservoirs take a writer lock
/// only for the append and never hold it across any await point.
pub struct MetricsCollector {
    start_time: Instant,
    total_ingested: AtomicU64,
    total_queries: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    ingestion_latency: RwLock<VecDeque<Duration>>,
    query_latency: RwLock<VecDeque<Duration>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_ingested: AtomicU64::new(0),
            total_queries: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            ingestion_latency: RwLock::new(VecDeque::with_capacity(RESERVOIR_CAPACITY)),
            query_latency: RwLock::new(VecDeque::with_capacity(RESERVOIR_CAPACITY)),
        }
    }

    /// Record a completed ingestion request.
    pub fn record_ingestion(&self, latency: Duration) {
        self.total_ingested.fetch_add(1, Ordering::Relaxed);
        push_sample(&self.ingestion_latency, latency);
    }

    /// Record a completed query, noting whether it was served from cache.
    pub fn record_query(&self, latency: Duration, cache_hit: bool) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
        push_sample(&self.query_latency, latency);
    }

    /// Compute a point-in-time snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let ingestion: Vec<Duration> = {
            let guard = self.ingestion_latency.read().unwrap_or_else(|e| e.into_inner());
            guard.iter().copied().collect()
        };
        let query: Vec<Duration> = {
            let guard = self.query_latency.read().unwrap_or_else(|e| e.into_inner());
            guard.iter().copied().collect()
        };

        let uptime_seconds = self.start_time.elapsed().as_secs_f64();
        let total_ingested = self.total_ingested.load(Ordering::Relaxed);
        let total_queries = self.total_queries.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);

        let ingestion_rate = if uptime_seconds > 0.0 {
            total_ingested as f64 / uptime_seconds
        } else {
            0.0
        };

        let cache_total = cache_hits + cache_misses;
        let cache_hit_ratio = if cache_total > 0 {
            cache_hits as f64 / cache_total as f64
        } else {
            0.0
        };

        let mut ingestion_sorted = ingestion;
        ingestion_sorted.sort_unstable();
        let mut query_sorted = query;
        query_sorted.sort_unstable();

        MetricsSnapshot {
            ingestion_rate,
            total_logs_ingested: total_ingested,
            total_queries,
            avg_ingestion_latency_ms: average_ms(&ingestion_sorted),
            p95_ingestion_latency_ms: percentile_ms(&ingestion_sorted, 0.95),
            p99_ingestion_latency_ms: percentile_ms(&ingestion_sorted, 0.99),
            avg_query_latency_ms: average_ms(&query_sorted),
            p95_query_latency_ms: percentile_ms(&query_sorted, 0.95),
            cache_hit_ratio,
            cache_hits,
            cache_misses,
            uptime_seconds,
        }
    }
}

fn push_sample(reservoir: &RwLock<VecDeque<Duration>>, latency: Duration) {
    let mut guard = reservoir.write().unwrap_or_else(|e| e.into_inner());
    if guard.len() == RESERVOIR_CAPACITY {
        guard.pop_front();
    }
    guard.push_back(latency);
}

/// Mean of the samples in whole milliseconds (per-sample truncation).
fn average_ms(samples: &[Duration]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u64 = samples.iter().map(|d| d.as_millis() as u64).sum();
    sum as f64 / samples.len() as f64
}

/// Value at index `floor(p * N)` of the ascending-sorted samples, clamped to
/// the last element. Zero when the reservoir is empty.
fn percentile_ms(sorted: &[Duration], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let index = ((sorted.len() as f64 * p) as usize).min(sorted.len() - 1);
    sorted[index].as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_snapshot_is_all_zeros() {
        let collector = MetricsCollector::new();
        let snap = collector.snapshot();

        assert_eq!(snap.total_logs_ingested, 0);
        assert_eq!(snap.total_queries, 0);
        assert_eq!(snap.avg_ingestion_latency_ms, 0.0);
        assert_eq!(snap.p95_ingestion_latency_ms, 0);
        assert_eq!(snap.p99_ingestion_latency_ms, 0);
        assert_eq!(snap.cache_hit_ratio, 0.0);
    }

    #[test]
    fn counters_and_hit_ratio() {
        let collector = MetricsCollector::new();
        collector.record_query(Duration::from_millis(5), false);
        collector.record_query(Duration::from_millis(5), true);
        collector.record_query(Duration::from_millis(5), true);
        collector.record_query(Duration::from_millis(5), true);

        let snap = collector.snapshot();
        assert_eq!(snap.total_queries, 4);
        assert_eq!(snap.cache_hits, 3);
        assert_eq!(snap.cache_misses, 1);
        assert_eq!(snap.cache_hits + snap.cache_misses, snap.total_queries);
        assert!((snap.cache_hit_ratio - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn reservoir_evicts_oldest_on_overflow() {
        let collector = MetricsCollector::new();
        // 100ms samples, then enough 1ms samples to push them all out.
        for _ in 0..10 {
            collector.record_ingestion(Duration::from_millis(100));
        }
        for _ in 0..RESERVOIR_CAPACITY {
            collector.record_ingestion(Duration::from_millis(1));
        }

        let snap = collector.snapshot();
        assert_eq!(snap.total_logs_ingested, (RESERVOIR_CAPACITY + 10) as u64);
        assert_eq!(snap.p99_ingestion_latency_ms, 1);
        assert_eq!(snap.avg_ingestion_latency_ms, 1.0);
    }

    #[test]
    fn percentiles_are_monotonic() {
        let collector = MetricsCollector::new();
        for ms in 1..=100u64 {
            collector.record_ingestion(Duration::from_millis(ms));
        }

        let snap = collector.snapshot();
        assert!(snap.p99_ingestion_latency_ms >= snap.p95_ingestion_latency_ms);
        assert!(snap.p95_ingestion_latency_ms as f64 >= snap.avg_ingestion_latency_ms);
        // Bounded error: p95 of 1..=100ms must land near 95ms.
        assert!((90..=100).contains(&snap.p95_ingestion_latency_ms));
    }

    #[test]
    fn percentile_of_single_sample_is_that_sample() {
        let collector = MetricsCollector::new();
        collector.record_query(Duration::from_millis(7), false);

        let snap = collector.snapshot();
        assert_eq!(snap.p95_query_latency_ms, 7);
        assert_eq!(snap.avg_query_latency_ms, 7.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_recording_is_lossless_on_counters() {
        let collector = Arc::new(MetricsCollector::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let collector = Arc::clone(&collector);
            handles.push(tokio::spawn(async move {
                for _ in 0..1000 {
                    collector.record_ingestion(Duration::from_micros(250));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snap = collector.snapshot();
        assert_eq!(snap.total_logs_ingested, 8000);

        let len = collector
            .ingestion_latency
            .read()
            .unwrap()
            .len();
        assert_eq!(len, RESERVOIR_CAPACITY);
    }

    #[test]
    fn snapshot_serializes_expected_keys() {
        let snap = MetricsCollector::new().snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        for key in [
            "ingestion_rate",
            "total_logs_ingested",
            "total_queries",
            "avg_ingestion_latency_ms",
            "p95_ingestion_latency_ms",
            "p99_ingestion_latency_ms",
            "avg_query_latency_ms",
            "p95_query_latency_ms",
            "cache_hit_ratio",
            "cache_hits",
            "cache_misses",
            "uptime_seconds",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }
}
