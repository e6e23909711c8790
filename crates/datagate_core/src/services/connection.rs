//! Database connection pooling with deadpool-postgres.
//!
//! Provides the production [`Database`] handle:
//! - Connection validation on pool creation, so bad credentials fail at startup
//! - Per-connection statement timeout
//! - Pool status reporting for the health endpoint

use crate::error::GatewayError;
use crate::models::{CatalogColumn, ConnectionConfig, PoolStatus, QueryResultRow};
use crate::services::database::Database;
use crate::services::values::{row_to_json, text_cast_select};

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use futures_util::StreamExt;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{NoTls, Statement, ToStatement};

/// How long a request waits for a free connection before failing.
const POOL_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// A managed pool of connections to the portal database.
pub struct ConnectionPool {
    /// Original connection configuration
    config: Arc<ConnectionConfig>,
    /// The actual connection pool
    pool: Pool,
}

impl ConnectionPool {
    /// Create a new connection pool and validate it with a test query.
    pub async fn new(config: ConnectionConfig, password: &str) -> Result<Self, GatewayError> {
        let pool = Self::build_pool(&config, password)?;

        let client = pool.get().await.map_err(|e| {
            GatewayError::storage_unavailable_with_source("Failed to establish connection", e)
        })?;

        client
            .execute("SELECT 1", &[])
            .await
            .map_err(|e| GatewayError::from_catalog_error("Connection validation failed", e))?;

        tracing::info!(
            url = %config.display_url(),
            schema = %config.schema,
            pool_size = config.options.pool_size,
            "Connection pool created successfully"
        );

        Ok(Self { config: Arc::new(config), pool })
    }

    fn build_pool(config: &ConnectionConfig, password: &str) -> Result<Pool, GatewayError> {
        let connect_timeout = Duration::from_secs(u64::from(config.options.connect_timeout_secs));

        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.username);
        pg_config.password(password);
        pg_config.application_name(&config.options.application_name);
        pg_config.connect_timeout(connect_timeout);
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(60));
        if let Some(options) = config.startup_options() {
            pg_config.options(&options);
        }

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig { recycling_method: RecyclingMethod::Fast },
        );

        Pool::builder(manager)
            .max_size(config.options.pool_size)
            .wait_timeout(Some(POOL_WAIT_TIMEOUT))
            .create_timeout(Some(connect_timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to create pool: {e}")))
    }

    /// Acquire a connection from the pool.
    pub async fn get(&self) -> Result<PooledConnection, GatewayError> {
        let client = self.pool.get().await.map_err(|e| {
            let status = self.pool.status();
            tracing::warn!(
                waiting = status.waiting,
                size = status.size,
                error = %e,
                "Failed to acquire connection"
            );
            GatewayError::storage_unavailable_with_source("Failed to acquire connection", e)
        })?;

        Ok(PooledConnection { client })
    }
}

#[async_trait]
impl Database for ConnectionPool {
    async fn list_table_names(&self, schema: &str) -> Result<Vec<String>, GatewayError> {
        let conn = self.get().await?;
        let rows = conn
            .query(
                r#"
                SELECT tablename
                FROM pg_catalog.pg_tables
                WHERE schemaname = $1
                ORDER BY tablename
                "#,
                &[&schema],
            )
            .await
            .map_err(|e| GatewayError::from_catalog_error("Failed to list tables", e))?;

        rows.iter()
            .map(|row| row.try_get::<_, String>("tablename"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| GatewayError::from_catalog_error("Failed to read table names", e))
    }

    async fn list_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<CatalogColumn>, GatewayError> {
        let conn = self.get().await?;
        let rows = conn
            .query(
                r#"
                SELECT column_name::text AS name, data_type::text AS data_type
                FROM information_schema.columns
                WHERE table_schema = $1
                  AND table_name = $2
                ORDER BY ordinal_position
                "#,
                &[&schema, &table],
            )
            .await
            .map_err(|e| GatewayError::from_catalog_error("Failed to list columns", e))?;

        rows.iter()
            .map(|row| {
                Ok(CatalogColumn {
                    name: row.try_get("name")?,
                    data_type: row.try_get("data_type")?,
                })
            })
            .collect::<Result<Vec<_>, tokio_postgres::Error>>()
            .map_err(|e| GatewayError::from_catalog_error("Failed to read columns", e))
    }

    async fn fetch_rows(
        &self,
        sql: &str,
        max_rows: usize,
    ) -> Result<Vec<QueryResultRow>, GatewayError> {
        let conn = self.get().await?;
        let statement = conn.prepare(sql).await.map_err(GatewayError::from_select_error)?;
        let columns: Vec<(&str, &Type)> =
            statement.columns().iter().map(|c| (c.name(), c.type_())).collect();

        let stream = match text_cast_select(sql, &columns) {
            Some(cast_sql) => {
                tracing::debug!(sql = %cast_sql, "Fetching undecodable columns as text");
                conn.query_raw(cast_sql.as_str()).await
            }
            None => conn.query_raw(&statement).await,
        }
        .map_err(GatewayError::from_select_error)?;
        let mut stream = pin!(stream);

        let mut rows = Vec::new();
        while rows.len() < max_rows {
            match stream.next().await {
                Some(Ok(row)) => rows.push(row_to_json(&row)),
                Some(Err(e)) => return Err(GatewayError::from_select_error(e)),
                None => break,
            }
        }

        Ok(rows)
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let conn = self.get().await?;
        conn.query("SELECT 1", &[])
            .await
            .map(|_| ())
            .map_err(|e| GatewayError::from_catalog_error("Health check failed", e))
    }

    fn status(&self) -> Option<PoolStatus> {
        let status = self.pool.status();
        Some(PoolStatus {
            max_size: status.max_size,
            size: status.size,
            available: status.available as isize,
            waiting: status.waiting,
        })
    }

    fn close(&self) {
        self.pool.close();
        tracing::info!(url = %self.config.display_url(), "Connection pool closed");
    }
}

/// A connection acquired from the pool.
///
/// Automatically returns to the pool when dropped.
pub struct PooledConnection {
    client: deadpool_postgres::Client,
}

impl PooledConnection {
    /// Execute a parameterized query that returns rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<tokio_postgres::Row>, tokio_postgres::Error> {
        self.client.query(sql, params).await
    }

    /// Execute a statement that doesn't return rows.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, tokio_postgres::Error> {
        self.client.execute(sql, params).await
    }

    /// Prepare a statement to inspect its result columns.
    pub async fn prepare(&self, sql: &str) -> Result<Statement, tokio_postgres::Error> {
        self.client.prepare(sql).await
    }

    /// Start a parameterless query and stream its rows.
    pub async fn query_raw<T>(
        &self,
        statement: &T,
    ) -> Result<tokio_postgres::RowStream, tokio_postgres::Error>
    where
        T: ?Sized + ToStatement,
    {
        self.client.query_raw(statement, std::iter::empty::<&(dyn ToSql + Sync)>()).await
    }
}
