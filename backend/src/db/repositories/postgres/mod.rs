//! Postgres document store using Diesel.
//!
//! Every document is one row of the `documents` table: its full path, the path
//! of its parent collection, and the field map as JSONB. Queries load a
//! collection by its indexed `collection` column and evaluate filters and
//! ordering with [`Query::apply`], so results match the in-memory store.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde_json::Value;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::db::repository::batch::resolve_batch;
use crate::db::repository::{
    check_batch_limits, check_query_limits, Document, DocumentChange, DocumentPath,
    DocumentStore, ErrorContext, Query, RepositoryError, RepositoryResult, StoreLimits,
    WriteBatch,
};

mod models;
mod schema;

use models::*;
use schema::documents;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
    /// Capability limits enforced before touching the database
    pub limits: StoreLimits,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
            limits: StoreLimits::default(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from the `PG_*` environment variables.
    pub fn from_env() -> RepositoryResult<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| {
                RepositoryError::configuration("DATABASE_URL or PG_DATABASE_URL must be set")
            })?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
            limits: defaults.limits,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total operations executed
    pub total_queries: u64,
    /// Total failed operations
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed [`DocumentStore`].
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Build the pool and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run `f` on a pooled connection, retrying retryable failures with
    /// exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let mut retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut attempt = 0;
            loop {
                let result = pool
                    .get()
                    .map_err(|e| {
                        RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        )
                    })
                    .and_then(|mut conn| {
                        total_queries.fetch_add(1, Ordering::Relaxed);
                        f.clone()(&mut conn)
                    });

                match result {
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        attempt += 1;
                        retried_operations.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(attempt, error = %e, "retrying postgres operation");
                        std::thread::sleep(retry_delay);
                        retry_delay *= 2;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                    Ok(value) => return Ok(value),
                }
            }
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Current pool state and operation counters.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Returns (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        let result = self.health_check().await;
        let latency = Some(start.elapsed().as_millis() as u64);
        match result {
            Ok(true) => (true, latency, None),
            Ok(false) => (false, latency, Some("Health check returned false".to_string())),
            Err(e) => (false, latency, Some(e.to_string())),
        }
    }
}

fn row_to_document(row: DocumentRow) -> RepositoryResult<Document> {
    let path = DocumentPath::parse(row.path.clone())?;
    Ok(Document::new(path, row.into_fields()))
}

fn load_fields(
    conn: &mut PgConnection,
    path: &DocumentPath,
) -> RepositoryResult<Option<serde_json::Map<String, Value>>> {
    let row = documents::table
        .filter(documents::path.eq(path.as_str()))
        .select(DocumentRow::as_select())
        .for_update()
        .first::<DocumentRow>(conn)
        .optional()?;
    Ok(row.map(DocumentRow::into_fields))
}

#[async_trait]
impl DocumentStore for PostgresRepository {
    async fn get(&self, path: &DocumentPath) -> RepositoryResult<Option<Document>> {
        path.validate()?;
        let path = path.clone();
        self.with_conn(move |conn| {
            let row = documents::table
                .filter(documents::path.eq(path.as_str()))
                .select(DocumentRow::as_select())
                .first::<DocumentRow>(conn)
                .optional()?;
            row.map(row_to_document).transpose()
        })
        .await
    }

    async fn query(&self, query: &Query) -> RepositoryResult<Vec<Document>> {
        check_query_limits(query, &self.config.limits)?;
        let query = query.clone();
        self.with_conn(move |conn| {
            let rows = documents::table
                .filter(documents::collection.eq(query.collection_str()))
                .select(DocumentRow::as_select())
                .load::<DocumentRow>(conn)?;
            let docs = rows
                .into_iter()
                .map(row_to_document)
                .collect::<RepositoryResult<Vec<_>>>()?;
            Ok(query.apply(docs))
        })
        .await
    }

    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<Vec<DocumentChange>> {
        check_batch_limits(&batch, &self.config.limits)?;
        let ops = batch.into_ops();
        let now = Utc::now();

        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let changes = resolve_batch(&ops, now, |path| load_fields(tx, path))?;

                for change in &changes {
                    match &change.after {
                        Some(doc) => {
                            let row = NewDocumentRow {
                                path: change.path.as_str().to_string(),
                                collection: change.path.parent().as_str().to_string(),
                                data: Value::Object(doc.data.clone()),
                                updated_at: now,
                            };
                            diesel::insert_into(documents::table)
                                .values(&row)
                                .on_conflict(documents::path)
                                .do_update()
                                .set((
                                    documents::data.eq(excluded(documents::data)),
                                    documents::updated_at.eq(excluded(documents::updated_at)),
                                ))
                                .execute(tx)?;
                        }
                        None => {
                            diesel::delete(
                                documents::table.filter(documents::path.eq(change.path.as_str())),
                            )
                            .execute(tx)?;
                        }
                    }
                }
                Ok(changes)
            })
        })
        .await
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    fn limits(&self) -> StoreLimits {
        self.config.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_with_url_keeps_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/league");
        assert_eq!(config.database_url, "postgres://localhost/league");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.limits, StoreLimits::default());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or::<u32>("LEAGUE_TEST_UNSET_VARIABLE", 7), 7);
    }
}
