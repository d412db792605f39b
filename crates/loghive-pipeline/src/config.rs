//! Pipeline Configuration

use std::time::Duration;

/// Shape of the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of persistence workers draining the staging channel.
    pub worker_count: usize,
    /// Capacity of the staging channel. Admission fails fast once full.
    pub buffer_size: usize,
    /// Events accumulated per worker before a flush is forced.
    pub batch_size: usize,
    /// Maximum time a non-empty batch may wait before being flushed.
    pub batch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            buffer_size: 10_000,
            batch_size: 100,
            batch_timeout: Duration::from_secs(1),
        }
    }
}

impl PipelineConfig {
    /// Clamp degenerate values so the pipeline always makes progress.
    pub(crate) fn normalized(mut self) -> Self {
        self.worker_count = self.worker_count.max(1);
        self.buffer_size = self.buffer_size.max(1);
        self.batch_size = self.batch_size.max(1);
        if self.batch_timeout.is_zero() {
            self.batch_timeout = Duration::from_millis(1);
        }
        self
    }
}
