//! PostgreSQL Log Store
//!
//! Production [`LogStore`] backend over a sqlx connection pool.
//!
//! ## Implementation notes
//!
//! - Uses **runtime queries** (`sqlx::query` / `QueryBuilder`) rather than
//!   compile-time macros, so the crate builds without a `DATABASE_URL` and
//!   the filter clauses can be assembled dynamically per request.
//! - Migrations run automatically on construction via
//!   `sqlx::migrate!("./migrations")`.
//! - `batch_insert` wraps the whole batch in one transaction: a failing row
//!   rolls back every row, keeping at-most-once-per-flush semantics simple
//!   to reason about upstream.
//! - `ingested_at` is stamped here, once per insert call, not at admission
//!   time.
//!
//! ## Pooling
//!
//! `new` applies a default pool of 20 connections. Servers that need
//! configured limits (max/min connections, max lifetime) construct the pool
//! options themselves and use [`PostgresLogStore::with_pool_options`].

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loghive_core::{LogEvent, LogQuery, Severity};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::LogStore;

pub struct PostgresLogStore {
    pool: PgPool,
}

impl PostgresLogStore {
    /// Connect with default pool settings and run migrations.
    pub async fn new(url: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)?;
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Connect with caller-provided pool settings and run migrations.
    pub async fn with_pool_options(url: &str, pool_options: PgPoolOptions) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)?;
        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LogStore for PostgresLogStore {
    async fn insert(&self, event: &LogEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO logs (id, timestamp, severity, source, message, ingested_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(event.timestamp)
        .bind(event.severity.as_str())
        .bind(&event.source)
        .bind(&event.message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn batch_insert(&self, events: &[LogEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let ingested_at = Utc::now();

        for event in events {
            sqlx::query(
                r#"
                INSERT INTO logs (id, timestamp, severity, source, message, ingested_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(event.id)
            .bind(event.timestamp)
            .bind(event.severity.as_str())
            .bind(&event.source)
            .bind(&event.message)
            .bind(ingested_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, query: &LogQuery) -> Result<(Vec<LogEvent>, i64)> {
        let total: i64 = {
            let mut qb: QueryBuilder<sqlx::Postgres> =
                QueryBuilder::new("SELECT COUNT(*) FROM logs WHERE timestamp >= ");
            push_filters(&mut qb, query);
            qb.build_query_scalar().fetch_one(&self.pool).await?
        };

        let rows: Vec<PgRow> = {
            let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
                "SELECT id, timestamp, severity, source, message, ingested_at \
                 FROM logs WHERE timestamp >= ",
            );
            push_filters(&mut qb, query);
            qb.push(" ORDER BY timestamp DESC LIMIT ");
            qb.push_bind(query.limit);
            qb.push(" OFFSET ");
            qb.push_bind(query.offset);
            qb.build().fetch_all(&self.pool).await?
        };

        let logs = rows
            .iter()
            .map(event_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((logs, total))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<LogEvent>> {
        let row = sqlx::query(
            r#"
            SELECT id, timestamp, severity, source, message, ingested_at
            FROM logs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn health(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Append the shared WHERE clause: inclusive time range, optional severity
/// set, optional exact source match. The builder is expected to end in
/// `"WHERE timestamp >= "`.
fn push_filters(qb: &mut QueryBuilder<'_, sqlx::Postgres>, query: &LogQuery) {
    qb.push_bind(query.start_time);
    qb.push(" AND timestamp <= ");
    qb.push_bind(query.end_time);

    if !query.severities.is_empty() {
        qb.push(" AND severity = ANY(");
        qb.push_bind(query.severities.clone());
        qb.push(")");
    }

    if let Some(source) = &query.source {
        qb.push(" AND source = ");
        qb.push_bind(source.clone());
    }
}

fn event_from_row(row: &PgRow) -> Result<LogEvent> {
    let id: Uuid = row.try_get("id")?;
    let severity_text: String = row.try_get("severity")?;
    let severity = Severity::from_str(&severity_text).map_err(|_| StoreError::CorruptRow {
        id: id.to_string(),
        reason: format!("unknown severity {:?}", severity_text),
    })?;

    let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
    let ingested_at: DateTime<Utc> = row.try_get("ingested_at")?;

    Ok(LogEvent {
        id,
        timestamp,
        severity,
        source: row.try_get("source")?,
        message: row.try_get("message")?,
        ingested_at: Some(ingested_at),
    })
}
