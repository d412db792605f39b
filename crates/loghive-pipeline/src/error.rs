//! Pipeline Error Types

use thiserror::Error;

use loghive_core::ValidationError;

/// Admission failures surfaced to callers of `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The staging channel is at capacity. Retryable backpressure; the
    /// caller chooses whether and when to retry.
    #[error("staging channel is full")]
    ChannelFull,

    /// The pipeline is stopping or stopped and accepts no further events.
    #[error("pipeline is not accepting events")]
    Cancelled,
}

impl PipelineError {
    /// Stable wire code for error responses.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::ChannelFull => "channel_full",
            PipelineError::Cancelled => "shutting_down",
        }
    }
}

/// Failures of the ingestion service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
