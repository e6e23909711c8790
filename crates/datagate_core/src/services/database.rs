//! The database handle shared by all gateway operations.
//!
//! Handlers never reach a global pool; they receive an `Arc<dyn Database>` built
//! once at startup. [`crate::services::ConnectionPool`] is the PostgreSQL
//! implementation.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{CatalogColumn, PoolStatus, QueryResultRow};

/// Read-only access to catalog metadata and row data.
#[async_trait]
pub trait Database: Send + Sync {
    /// Names of the ordinary tables in `schema`.
    ///
    /// Fails with [`GatewayError::StorageUnavailable`].
    async fn list_table_names(&self, schema: &str) -> Result<Vec<String>, GatewayError>;

    /// Columns of `schema.table`, in ordinal order. Unknown table yields an empty list.
    ///
    /// Both names are bound parameters, never interpolated.
    /// Fails with [`GatewayError::StorageUnavailable`].
    async fn list_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<CatalogColumn>, GatewayError>;

    /// Execute a fully built `SELECT` and collect at most `max_rows` rows.
    ///
    /// Fails with [`GatewayError::QueryExecutionFailed`], or
    /// [`GatewayError::StorageUnavailable`] when no connection can be obtained.
    async fn fetch_rows(
        &self,
        sql: &str,
        max_rows: usize,
    ) -> Result<Vec<QueryResultRow>, GatewayError>;

    /// Round-trip a trivial statement.
    async fn ping(&self) -> Result<(), GatewayError>;

    /// Current pool status, if the handle is pooled.
    fn status(&self) -> Option<PoolStatus> {
        None
    }

    /// Release all connections. Called once on shutdown.
    fn close(&self) {}
}
