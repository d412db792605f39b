//! LogHive REST API
//!
//! HTTP/JSON surface for log producers and operators:
//!
//! | Method & path | Purpose |
//! |---|---|
//! | `POST /api/v1/logs/ingest` | Single ingest, 201 on success |
//! | `POST /api/v1/logs/ingest/batch` | Batch ingest, 202 with per-item results |
//! | `GET /api/v1/logs/query` | Time-bounded query, 200 |
//! | `GET /api/v1/metrics` | Metrics snapshot, 200 |
//! | `GET /health` | Dependency health, 200 or 503 |
//!
//! Handlers translate domain errors into the stable status mapping: 400 for
//! malformed payloads, 422 for validation failures, 500 for pipeline or
//! store errors, 503 while shutting down or when a dependency is down.
//! Panics anywhere below a handler are converted into a JSON 500 by the
//! catch-panic layer.

use std::any::Any;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use loghive_core::ErrorResponse;
use loghive_observability::MetricsCollector;
use loghive_pipeline::IngestionService;
use loghive_store::{LogStore, QueryCache, QueryEngine};

pub mod error;
pub mod handlers;
pub mod shutdown;

pub use shutdown::shutdown_signal;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<IngestionService>,
    pub query_engine: Arc<QueryEngine>,
    pub metrics: Arc<MetricsCollector>,
    pub store: Arc<dyn LogStore>,
    pub cache: Arc<dyn QueryCache>,
}

/// Build the full router with middleware applied.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/logs/ingest", post(handlers::ingest::ingest))
        .route("/logs/ingest/batch", post(handlers::ingest::ingest_batch))
        .route("/logs/query", get(handlers::query::query))
        .route("/metrics", get(handlers::metrics::metrics))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health::health))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until the shutdown future resolves, then let
/// in-flight requests drain.
pub async fn serve(
    router: Router,
    addr: std::net::SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Convert a handler panic into the standard 500 error body.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "request handler panicked");

    let body = ErrorResponse::new("internal_server_error", "An unexpected error occurred");
    let bytes = serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec());

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
