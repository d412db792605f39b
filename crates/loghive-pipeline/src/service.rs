//! Ingestion Service
//!
//! Thin layer between validated boundary requests and the pipeline: assigns
//! event ids, converts transfer shapes into [`LogEvent`]s, and translates
//! per-item admission failures into batch response entries.

use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use loghive_core::{
    BatchIngestRequest, BatchIngestResponse, BatchItemError, IngestRequest, IngestResponse,
    LogEvent, Severity, ValidationError,
};

use crate::error::IngestError;
use crate::pipeline::IngestionPipeline;

pub struct IngestionService {
    pipeline: Arc<IngestionPipeline>,
}

impl IngestionService {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        Self { pipeline }
    }

    /// Admit a single validated request. The returned id is assigned here,
    /// never taken from the client.
    pub fn ingest(&self, req: &IngestRequest) -> Result<IngestResponse, IngestError> {
        let event = build_event(req)?;
        let id = event.id;
        let timestamp = event.timestamp;

        self.pipeline.submit(event).map_err(|e| {
            warn!(error = %e, "failed to stage log event");
            IngestError::Pipeline(e)
        })?;

        Ok(IngestResponse {
            id,
            status: "ingested".to_string(),
            timestamp,
        })
    }

    /// Admit a batch of validated requests. Admission failures are recorded
    /// per item; the batch as a whole always produces a response.
    pub fn ingest_batch(&self, req: &BatchIngestRequest) -> BatchIngestResponse {
        let mut response = BatchIngestResponse {
            accepted: 0,
            rejected: 0,
            errors: Vec::new(),
        };

        for (index, item) in req.logs.iter().enumerate() {
            let event = match build_event(item) {
                Ok(event) => event,
                Err(e) => {
                    response.rejected += 1;
                    response.errors.push(BatchItemError {
                        index: index.to_string(),
                        error: e.to_string(),
                        log_id: String::new(),
                    });
                    continue;
                }
            };

            let id = event.id;
            match self.pipeline.submit(event) {
                Ok(()) => response.accepted += 1,
                Err(e) => {
                    response.rejected += 1;
                    response.errors.push(BatchItemError {
                        index: index.to_string(),
                        error: e.to_string(),
                        log_id: id.to_string(),
                    });
                }
            }
        }

        response
    }
}

fn build_event(req: &IngestRequest) -> Result<LogEvent, IngestError> {
    let timestamp = req
        .timestamp
        .ok_or(IngestError::Validation(ValidationError::InvalidTimestamp))?;
    let severity = Severity::from_str(&req.severity).map_err(IngestError::Validation)?;

    Ok(LogEvent::new(
        timestamp,
        severity,
        req.source.clone(),
        req.message.clone(),
    ))
}
