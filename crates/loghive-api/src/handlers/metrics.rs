//! Metrics endpoint

use axum::extract::State;
use axum::Json;

use loghive_observability::MetricsSnapshot;

use crate::AppState;

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
