//! HTTP Error Mapping
//!
//! [`ApiError`] pairs a status code with the standard JSON error body and
//! implements `IntoResponse`, so handlers can return it directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use loghive_core::{ErrorResponse, ValidationError};
use loghive_pipeline::{IngestError, PipelineError};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.body = self.body.with_details(details);
        self
    }

    /// 400 for structurally broken input (malformed JSON, bad parameters).
    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 422 carrying the validator's stable code.
    pub fn validation(err: &ValidationError) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.code(),
            err.to_string(),
        )
    }

    pub fn internal(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }
}

impl From<&IngestError> for ApiError {
    fn from(err: &IngestError) -> Self {
        match err {
            IngestError::Validation(e) => ApiError::validation(e),
            IngestError::Pipeline(PipelineError::ChannelFull) => ApiError::internal(
                PipelineError::ChannelFull.code(),
                "Ingestion is saturated, retry later",
            ),
            IngestError::Pipeline(PipelineError::Cancelled) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::Cancelled.code(),
                "Service is shutting down",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
