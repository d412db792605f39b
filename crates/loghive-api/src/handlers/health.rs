//! Health endpoint
//!
//! Probes both backing dependencies and reports 503 when either is down,
//! so load balancers stop routing before requests start failing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

const CONNECTED: &str = "connected";
const DISCONNECTED: &str = "disconnected";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub postgres: String,
    pub redis: String,
}

pub async fn health(State(state): State<AppState>) -> Response {
    let postgres = match state.store.health().await {
        Ok(()) => CONNECTED,
        Err(e) => {
            warn!(error = %e, "store health check failed");
            DISCONNECTED
        }
    };

    let redis = match state.cache.health().await {
        Ok(()) => CONNECTED,
        Err(e) => {
            warn!(error = %e, "cache health check failed");
            DISCONNECTED
        }
    };

    let healthy = postgres == CONNECTED && redis == CONNECTED;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        postgres: postgres.to_string(),
        redis: redis.to_string(),
    };

    (status, Json(body)).into_response()
}
