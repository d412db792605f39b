//! In-Memory Log Store
//!
//! [`MemoryLogStore`] keeps events in a `Vec` behind an async RwLock and
//! implements the same filtering, ordering and pagination semantics as the
//! PostgreSQL backend. Used by integration tests and for running the server
//! without a database.

use async_trait::async_trait;
use chrono::Utc;
use loghive_core::{LogEvent, LogQuery};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::LogStore;

#[derive(Default)]
pub struct MemoryLogStore {
    events: RwLock<Vec<LogEvent>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

fn matches(event: &LogEvent, query: &LogQuery) -> bool {
    if event.timestamp < query.start_time || event.timestamp > query.end_time {
        return false;
    }
    if !query.severities.is_empty()
        && !query
            .severities
            .iter()
            .any(|s| s == event.severity.as_str())
    {
        return false;
    }
    if let Some(source) = &query.source {
        if &event.source != source {
            return false;
        }
    }
    true
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, event: &LogEvent) -> Result<()> {
        let mut stamped = event.clone();
        stamped.ingested_at = Some(Utc::now());
        self.events.write().await.push(stamped);
        Ok(())
    }

    async fn batch_insert(&self, events: &[LogEvent]) -> Result<()> {
        let ingested_at = Utc::now();
        let mut guard = self.events.write().await;
        // Single write-lock scope keeps the batch atomic.
        for event in events {
            let mut stamped = event.clone();
            stamped.ingested_at = Some(ingested_at);
            guard.push(stamped);
        }
        Ok(())
    }

    async fn query(&self, query: &LogQuery) -> Result<(Vec<LogEvent>, i64)> {
        let guard = self.events.read().await;

        let mut matched: Vec<LogEvent> = guard
            .iter()
            .filter(|e| matches(e, query))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<LogEvent>> {
        let guard = self.events.read().await;
        Ok(guard.iter().find(|e| e.id == id).cloned())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use loghive_core::Severity;

    fn event(ts_offset_secs: i64, severity: Severity, source: &str) -> LogEvent {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        LogEvent::new(
            base + Duration::seconds(ts_offset_secs),
            severity,
            source.to_string(),
            "event body".to_string(),
        )
    }

    fn query_all() -> LogQuery {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        LogQuery {
            start_time: base - Duration::hours(1),
            end_time: base + Duration::hours(1),
            severities: vec![],
            source: None,
            limit: 100,
            offset: 0,
        }
    }

    #[tokio::test]
    async fn insert_stamps_ingested_at() {
        let store = MemoryLogStore::new();
        let event = event(0, Severity::Info, "a");
        store.insert(&event).await.unwrap();

        let fetched = store.get_by_id(event.id).await.unwrap().unwrap();
        assert!(fetched.ingested_at.is_some());
    }

    #[tokio::test]
    async fn query_orders_newest_first() {
        let store = MemoryLogStore::new();
        store.insert(&event(10, Severity::Low, "a")).await.unwrap();
        store.insert(&event(30, Severity::Low, "a")).await.unwrap();
        store.insert(&event(20, Severity::Low, "a")).await.unwrap();

        let (logs, total) = store.query(&query_all()).await.unwrap();
        assert_eq!(total, 3);
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let offsets: Vec<_> = logs
            .iter()
            .map(|l| (l.timestamp - base).num_seconds())
            .collect();
        assert_eq!(offsets, vec![30, 20, 10]);
    }

    #[tokio::test]
    async fn query_range_is_inclusive() {
        let store = MemoryLogStore::new();
        let e = event(0, Severity::High, "a");
        store.insert(&e).await.unwrap();

        let mut q = query_all();
        q.start_time = e.timestamp;
        q.end_time = e.timestamp;
        let (logs, total) = store.query(&q).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(logs[0].id, e.id);
    }

    #[tokio::test]
    async fn query_filters_severity_and_source() {
        let store = MemoryLogStore::new();
        store.insert(&event(1, Severity::High, "web")).await.unwrap();
        store.insert(&event(2, Severity::Low, "web")).await.unwrap();
        store.insert(&event(3, Severity::High, "db")).await.unwrap();

        let mut q = query_all();
        q.severities = vec!["HIGH".to_string()];
        let (_, total) = store.query(&q).await.unwrap();
        assert_eq!(total, 2);

        q.source = Some("web".to_string());
        let (logs, total) = store.query(&q).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(logs[0].source, "web");
    }

    #[tokio::test]
    async fn query_paginates_with_total_unchanged() {
        let store = MemoryLogStore::new();
        for i in 0..10 {
            store.insert(&event(i, Severity::Info, "a")).await.unwrap();
        }

        let mut q = query_all();
        q.limit = 3;
        q.offset = 8;
        let (logs, total) = store.query(&q).await.unwrap();
        assert_eq!(total, 10);
        assert_eq!(logs.len(), 2);
    }

    #[tokio::test]
    async fn get_by_id_misses_return_none() {
        let store = MemoryLogStore::new();
        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
