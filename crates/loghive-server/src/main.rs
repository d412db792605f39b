//! LogHive Server
//!
//! Single binary wiring the whole service together:
//!
//! 1. Structured logging (`RUST_LOG` filter, `LOG_FORMAT=json` for
//!    production log aggregation).
//! 2. Configuration from defaults, optional TOML file and `LOGHIVE_*`
//!    environment variables.
//! 3. PostgreSQL store (pooled, migrated on startup) and Redis result
//!    cache, both health-checked before the server accepts traffic.
//! 4. Ingestion pipeline (bounded staging channel + worker fleet).
//! 5. HTTP API with graceful shutdown: on SIGINT/SIGTERM the server stops
//!    accepting connections, drains in-flight requests, then stops the
//!    pipeline so every staged event is flushed before exit.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use loghive_api::{create_router, serve, shutdown_signal, AppState};
use loghive_observability::MetricsCollector;
use loghive_pipeline::{IngestionPipeline, IngestionService, PipelineConfig};
use loghive_store::{
    LogStore, PostgresLogStore, QueryCache, QueryEngine, RedisQueryCache,
};

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().context("failed to load configuration")?;
    info!(
        port = config.server.port,
        workers = config.ingestion.worker_count,
        buffer_size = config.ingestion.buffer_size,
        cache_enabled = config.cache.query_cache_enabled,
        "starting loghive"
    );

    // Store: pooled PostgreSQL with migrations on startup.
    let pool_options = PgPoolOptions::new()
        .max_connections(config.postgres.max_open_conns)
        .min_connections(config.postgres.max_idle_conns)
        .max_lifetime(config.postgres.conn_max_lifetime());
    let store = Arc::new(
        PostgresLogStore::with_pool_options(&config.postgres.url(), pool_options)
            .await
            .context("failed to connect to postgres")?,
    );
    store
        .health()
        .await
        .context("postgres health check failed")?;
    info!(host = %config.postgres.host, "postgres connected");

    // Cache: Redis is a hard startup dependency even when the query cache
    // is disabled, because /health reports on it.
    let cache = Arc::new(
        RedisQueryCache::connect(&config.redis.url())
            .await
            .context("failed to connect to redis")?,
    );
    cache.health().await.context("redis health check failed")?;
    info!(host = %config.redis.host, "redis connected");

    let store: Arc<dyn LogStore> = store;
    let cache: Arc<dyn QueryCache> = cache;
    let metrics = Arc::new(MetricsCollector::new());

    let pipeline = Arc::new(IngestionPipeline::new(
        PipelineConfig {
            worker_count: config.ingestion.worker_count,
            buffer_size: config.ingestion.buffer_size,
            batch_size: config.ingestion.batch_size,
            batch_timeout: config.ingestion.batch_timeout(),
        },
        Arc::clone(&store),
    ));
    pipeline.start().await;

    let state = AppState {
        ingestion: Arc::new(IngestionService::new(Arc::clone(&pipeline))),
        query_engine: Arc::new(QueryEngine::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&metrics),
            config.cache.query_cache_enabled,
            config.cache.ttl(),
        )),
        metrics,
        store,
        cache,
    };

    let request_timeout = config
        .server
        .read_timeout()
        .max(config.server.write_timeout());
    let router = create_router(state).layer(TimeoutLayer::new(request_timeout));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    serve(router, addr, shutdown_signal())
        .await
        .context("http server failed")?;

    info!("http server stopped, draining ingestion pipeline");
    let drain = pipeline.stop();
    if tokio::time::timeout(config.server.shutdown_timeout(), drain)
        .await
        .is_err()
    {
        warn!(
            timeout_ms = config.server.shutdown_timeout_ms,
            "pipeline drain exceeded shutdown timeout"
        );
    }

    info!("shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .init();
        }
    }
}
