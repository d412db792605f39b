//! Query endpoint
//!
//! Parses and validates the query string, then delegates to the cache-aware
//! query engine. The engine records query latency and cache hit/miss; the
//! handler only maps errors onto the status contract.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use loghive_core::{parse_timestamp, validate_query, QueryRequest};

use crate::error::ApiError;
use crate::AppState;

/// Raw query string shape. Timestamps arrive as RFC 3339 text and severity
/// as a comma-separated list.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub severity: Option<String>,
    pub source: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn query(
    State(state): State<AppState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return ApiError::bad_request("invalid_parameter", rejection.to_string())
                .into_response()
        }
    };

    let start_time = match parse_timestamp(params.start_time.as_deref().unwrap_or_default()) {
        Ok(t) => t,
        Err(_) => {
            return ApiError::bad_request("invalid_parameter", "Invalid start_time")
                .into_response()
        }
    };
    let end_time = match parse_timestamp(params.end_time.as_deref().unwrap_or_default()) {
        Ok(t) => t,
        Err(_) => {
            return ApiError::bad_request("invalid_parameter", "Invalid end_time").into_response()
        }
    };

    let severity = params
        .severity
        .as_deref()
        .map(|list| {
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let request = QueryRequest {
        start_time: Some(start_time),
        end_time: Some(end_time),
        severity,
        source: params.source.filter(|s| !s.is_empty()),
        limit: params.limit.unwrap_or(0),
        offset: params.offset.unwrap_or(0),
    };

    let query = match validate_query(&request) {
        Ok(query) => query,
        Err(e) => return ApiError::validation(&e).into_response(),
    };

    match state.query_engine.query(&query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!(error = %e, "query failed");
            ApiError::internal("query_failed", "Failed to query logs").into_response()
        }
    }
}
