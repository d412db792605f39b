//! Staging Channel and Worker Fleet
//!
//! [`IngestionPipeline`] owns the bounded staging channel and the worker
//! tasks that drain it. Lifecycle: `Created → Running → Stopping → Stopped`,
//! driven by [`IngestionPipeline::start`] and [`IngestionPipeline::stop`].
//!
//! ## Worker loop
//!
//! Each worker multiplexes over two wakeup sources:
//!
//! 1. An event arrives: append it to the local batch; flush when the batch
//!    reaches `batch_size` and reset the flush deadline.
//! 2. The flush deadline passes: flush a non-empty batch; reset the deadline
//!    either way.
//!
//! Closing the channel is the shutdown signal. Receivers keep draining
//! buffered events after close and only observe the closed state once the
//! channel is empty, at which point the worker flushes its partial batch and
//! exits.
//!
//! ## Ordering
//!
//! Events received by one worker are flushed in receive order. No order is
//! guaranteed across workers; `timestamp` is the only cross-worker ordering
//! signal, applied at query time.
//!
//! ## Failure policy
//!
//! A flush that fails or exceeds the write deadline is logged and dropped.
//! There is no retry and no re-enqueue, which bounds memory and avoids
//! retry amplification against a struggling store.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender, TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use loghive_core::LogEvent;
use loghive_store::LogStore;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Deadline applied to each store write.
const WRITE_DEADLINE: Duration = Duration::from_secs(10);

const STATE_CREATED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPING: u8 = 2;
const STATE_STOPPED: u8 = 3;

pub struct IngestionPipeline {
    config: PipelineConfig,
    store: Arc<dyn LogStore>,
    sender: Sender<LogEvent>,
    receiver: Receiver<LogEvent>,
    state: AtomicU8,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl IngestionPipeline {
    pub fn new(config: PipelineConfig, store: Arc<dyn LogStore>) -> Self {
        let config = config.normalized();
        let (sender, receiver) = async_channel::bounded(config.buffer_size);
        Self {
            config,
            store,
            sender,
            receiver,
            state: AtomicU8::new(STATE_CREATED),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the worker fleet and begin accepting events.
    ///
    /// Only the first call has any effect.
    pub async fn start(&self) {
        if self
            .state
            .compare_exchange(
                STATE_CREATED,
                STATE_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            warn!("ingestion pipeline already started");
            return;
        }

        info!(
            workers = self.config.worker_count,
            buffer_size = self.config.buffer_size,
            batch_size = self.config.batch_size,
            batch_timeout_ms = self.config.batch_timeout.as_millis() as u64,
            "starting ingestion pipeline"
        );

        let mut workers = self.workers.lock().await;
        for worker_id in 0..self.config.worker_count {
            let receiver = self.receiver.clone();
            let store = Arc::clone(&self.store);
            let batch_size = self.config.batch_size;
            let batch_timeout = self.config.batch_timeout;
            workers.push(tokio::spawn(worker_loop(
                worker_id,
                receiver,
                store,
                batch_size,
                batch_timeout,
            )));
        }
    }

    /// Non-blocking enqueue of one event.
    ///
    /// Fails with [`PipelineError::ChannelFull`] when the channel is at
    /// capacity and [`PipelineError::Cancelled`] once the pipeline has left
    /// the running state.
    pub fn submit(&self, event: LogEvent) -> Result<(), PipelineError> {
        if self.state.load(Ordering::Acquire) != STATE_RUNNING {
            return Err(PipelineError::Cancelled);
        }

        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PipelineError::ChannelFull),
            Err(TrySendError::Closed(_)) => Err(PipelineError::Cancelled),
        }
    }

    /// Graceful shutdown: stop admission, let workers drain and flush every
    /// staged event, and wait for all of them to exit.
    ///
    /// Idempotent; only the first call does any work.
    pub async fn stop(&self) {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_STOPPING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }

        info!("stopping ingestion pipeline");

        // Closing the channel is the shutdown signal: receivers drain what
        // is buffered, then observe the close and exit.
        self.sender.close();

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(e) = handle.await {
                error!(error = %e, "ingestion worker panicked");
            }
        }

        self.state.store(STATE_STOPPED, Ordering::Release);
        info!("ingestion pipeline stopped");
    }

    /// Whether the pipeline currently accepts events.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    /// Number of events currently staged in the channel.
    pub fn staged(&self) -> usize {
        self.sender.len()
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Receiver<LogEvent>,
    store: Arc<dyn LogStore>,
    batch_size: usize,
    batch_timeout: Duration,
) {
    debug!(worker_id, "ingestion worker started");

    let mut batch: Vec<LogEvent> = Vec::with_capacity(batch_size);
    let mut deadline = Instant::now() + batch_timeout;

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Ok(event) => {
                    batch.push(event);
                    if batch.len() >= batch_size {
                        flush_batch(worker_id, &store, &mut batch).await;
                        deadline = Instant::now() + batch_timeout;
                    }
                }
                Err(_) => {
                    // Channel closed and fully drained.
                    flush_batch(worker_id, &store, &mut batch).await;
                    break;
                }
            },
            _ = tokio::time::sleep_until(deadline) => {
                flush_batch(worker_id, &store, &mut batch).await;
                deadline = Instant::now() + batch_timeout;
            }
        }
    }

    debug!(worker_id, "ingestion worker stopped");
}

/// Write the accumulated batch to the store under the write deadline.
/// Failures drop the batch.
async fn flush_batch(worker_id: usize, store: &Arc<dyn LogStore>, batch: &mut Vec<LogEvent>) {
    if batch.is_empty() {
        return;
    }

    let events = std::mem::take(batch);
    let started = Instant::now();

    match tokio::time::timeout(WRITE_DEADLINE, store.batch_insert(&events)).await {
        Ok(Ok(())) => {
            debug!(
                worker_id,
                batch_size = events.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "batch persisted"
            );
        }
        Ok(Err(e)) => {
            error!(
                worker_id,
                batch_size = events.len(),
                error = %e,
                "failed to persist batch, dropping it"
            );
        }
        Err(_) => {
            error!(
                worker_id,
                batch_size = events.len(),
                deadline_secs = WRITE_DEADLINE.as_secs(),
                "batch write exceeded deadline, dropping it"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use loghive_core::{LogQuery, Severity};
    use loghive_store::{Result as StoreResult, StoreError};
    use tokio::sync::Semaphore;
    use uuid::Uuid;

    /// Store stub that records every batch it receives.
    #[derive(Default)]
    struct RecordingStore {
        batches: std::sync::Mutex<Vec<Vec<LogEvent>>>,
        /// When set, each batch_insert consumes one permit before writing.
        gate: Option<Arc<Semaphore>>,
        fail: bool,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self::default()
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn batches(&self) -> Vec<Vec<LogEvent>> {
            self.batches.lock().unwrap().clone()
        }

        fn total_events(&self) -> usize {
            self.batches.lock().unwrap().iter().map(Vec::len).sum()
        }
    }

    #[async_trait]
    impl LogStore for RecordingStore {
        async fn insert(&self, event: &LogEvent) -> StoreResult<()> {
            self.batch_insert(std::slice::from_ref(event)).await
        }

        async fn batch_insert(&self, events: &[LogEvent]) -> StoreResult<()> {
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            if self.fail {
                return Err(StoreError::Migration("injected failure".to_string()));
            }
            self.batches.lock().unwrap().push(events.to_vec());
            Ok(())
        }

        async fn query(&self, _query: &LogQuery) -> StoreResult<(Vec<LogEvent>, i64)> {
            Ok((vec![], 0))
        }

        async fn get_by_id(&self, _id: Uuid) -> StoreResult<Option<LogEvent>> {
            Ok(None)
        }

        async fn health(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    fn event(n: usize) -> LogEvent {
        LogEvent::new(
            Utc::now(),
            Severity::Info,
            "test-host".to_string(),
            format!("event {}", n),
        )
    }

    fn config(workers: usize, buffer: usize, batch: usize, timeout: Duration) -> PipelineConfig {
        PipelineConfig {
            worker_count: workers,
            buffer_size: buffer,
            batch_size: batch,
            batch_timeout: timeout,
        }
    }

    async fn wait_for<F: Fn() -> bool>(deadline: Duration, check: F) -> bool {
        let end = Instant::now() + deadline;
        while Instant::now() < end {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }

    #[tokio::test]
    async fn full_batches_flush_at_batch_size() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = IngestionPipeline::new(
            config(1, 1000, 10, Duration::from_secs(30)),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );
        pipeline.start().await;

        for n in 0..100 {
            pipeline.submit(event(n)).unwrap();
        }

        let store_ref = Arc::clone(&store);
        assert!(
            wait_for(Duration::from_secs(5), move || store_ref.total_events() == 100).await,
            "expected all 100 events to be persisted"
        );

        let batches = store.batches();
        assert_eq!(batches.len(), 10);
        assert!(batches.iter().all(|b| b.len() == 10));

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn partial_batch_flushes_on_timeout() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = IngestionPipeline::new(
            config(1, 100, 100, Duration::from_millis(50)),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );
        pipeline.start().await;

        for n in 0..3 {
            pipeline.submit(event(n)).unwrap();
        }

        let store_ref = Arc::clone(&store);
        assert!(
            wait_for(Duration::from_secs(2), move || store_ref.total_events() == 3).await,
            "expected the timer to flush the partial batch"
        );
        assert_eq!(store.batches().len(), 1);

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn events_flush_in_receive_order_within_a_worker() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = IngestionPipeline::new(
            config(1, 100, 3, Duration::from_secs(30)),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );
        pipeline.start().await;

        for n in 0..3 {
            pipeline.submit(event(n)).unwrap();
        }

        let store_ref = Arc::clone(&store);
        assert!(wait_for(Duration::from_secs(2), move || store_ref.total_events() == 3).await);

        let batches = store.batches();
        let messages: Vec<_> = batches[0].iter().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["event 0", "event 1", "event 2"]);

        pipeline.stop().await;
    }

    #[tokio::test]
    async fn full_channel_rejects_without_blocking() {
        let gate = Arc::new(Semaphore::new(0));
        let store = Arc::new(RecordingStore::gated(Arc::clone(&gate)));
        let pipeline = IngestionPipeline::new(
            config(1, 2, 1, Duration::from_secs(30)),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );
        pipeline.start().await;

        // The worker takes the first event and parks inside batch_insert.
        pipeline.submit(event(0)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Channel capacity is 2: two more submissions fit, the next fails.
        pipeline.submit(event(1)).unwrap();
        pipeline.submit(event(2)).unwrap();
        assert_eq!(pipeline.submit(event(3)), Err(PipelineError::ChannelFull));

        // Release the gate so shutdown can drain the remaining flushes.
        gate.add_permits(16);
        pipeline.stop().await;
        assert_eq!(store.total_events(), 3);
    }

    #[tokio::test]
    async fn stop_flushes_staged_events_before_returning() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = IngestionPipeline::new(
            config(1, 100, 100, Duration::from_secs(60)),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );
        pipeline.start().await;

        for n in 0..5 {
            pipeline.submit(event(n)).unwrap();
        }
        pipeline.stop().await;

        assert_eq!(store.total_events(), 5);
        assert_eq!(pipeline.staged(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_blocks_further_submits() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = IngestionPipeline::new(
            config(2, 100, 10, Duration::from_millis(50)),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );
        pipeline.start().await;
        pipeline.submit(event(0)).unwrap();

        pipeline.stop().await;
        pipeline.stop().await;

        assert!(!pipeline.is_running());
        assert_eq!(pipeline.submit(event(1)), Err(PipelineError::Cancelled));
        assert_eq!(store.total_events(), 1);
    }

    #[tokio::test]
    async fn submit_before_start_is_rejected() {
        let store = Arc::new(RecordingStore::new());
        let pipeline = IngestionPipeline::new(
            PipelineConfig::default(),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );

        assert_eq!(pipeline.submit(event(0)), Err(PipelineError::Cancelled));
    }

    #[tokio::test]
    async fn failed_flush_drops_the_batch() {
        let store = Arc::new(RecordingStore::failing());
        let pipeline = IngestionPipeline::new(
            config(1, 100, 2, Duration::from_millis(20)),
            Arc::clone(&store) as Arc<dyn LogStore>,
        );
        pipeline.start().await;

        pipeline.submit(event(0)).unwrap();
        pipeline.submit(event(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        pipeline.stop().await;

        // Nothing persisted, nothing left staged: the batch was dropped.
        assert_eq!(store.total_events(), 0);
        assert_eq!(pipeline.staged(), 0);
    }
}
