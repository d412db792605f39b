//! Ingest endpoints
//!
//! Single ingest returns 201 with the assigned id; batch ingest returns 202
//! with per-item accept/reject accounting. Both record one ingestion latency
//! sample per request, whatever the outcome.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use loghive_core::{validate_ingest, BatchIngestRequest, IngestRequest};

use crate::error::ApiError;
use crate::AppState;

pub async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let response = handle_ingest(&state, payload);
    state.metrics.record_ingestion(started.elapsed());
    response
}

fn handle_ingest(
    state: &AppState,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            debug!(error = %rejection, "rejected unparseable ingest payload");
            return ApiError::bad_request("invalid_request", "Invalid JSON payload")
                .into_response();
        }
    };

    if let Err(e) = validate_ingest(&req) {
        return ApiError::validation(&e).into_response();
    }

    match state.ingestion.ingest(&req) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => ApiError::from(&e).into_response(),
    }
}

pub async fn ingest_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchIngestRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let response = handle_ingest_batch(&state, payload);
    state.metrics.record_ingestion(started.elapsed());
    response
}

fn handle_ingest_batch(
    state: &AppState,
    payload: Result<Json<BatchIngestRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            debug!(error = %rejection, "rejected unparseable batch payload");
            return ApiError::bad_request("invalid_request", "Invalid JSON payload")
                .into_response();
        }
    };

    if req.logs.is_empty() {
        return ApiError::bad_request("invalid_request", "No logs provided").into_response();
    }

    // The whole batch is validated before anything is staged, so a bad
    // entry cannot leave part of the batch admitted.
    for (index, item) in req.logs.iter().enumerate() {
        if let Err(e) = validate_ingest(item) {
            return ApiError::validation(&e)
                .with_details(serde_json::json!({ "log_index": index }))
                .into_response();
        }
    }

    let response = state.ingestion.ingest_batch(&req);
    (StatusCode::ACCEPTED, Json(response)).into_response()
}
