//! Bounded query execution over one client-chosen table.
//!
//! The executor validates the request, builds
//! `SELECT "c1", "c2", ... FROM "table" LIMIT 1000` from sanitized identifiers
//! and returns the rows untouched.

use std::time::Instant;

use crate::error::GatewayError;
use crate::models::{QueryRequest, QueryResultRow, ROW_LIMIT};
use crate::services::database::Database;
use crate::services::sanitize::sanitize_identifier;

/// Service for executing the dynamic table query.
pub struct QueryService;

impl QueryService {
    /// Validate, build and execute the query described by `request`.
    pub async fn run(
        db: &dyn Database,
        request: &QueryRequest,
    ) -> Result<Vec<QueryResultRow>, GatewayError> {
        if request.translate_codes.is_some() {
            tracing::debug!(
                table = %request.table_name,
                "translateCodes is not supported and was ignored"
            );
        }
        Self::run_select(db, &request.table_name, &request.columns).await
    }

    /// Select `columns` from `table_name`, at most [`ROW_LIMIT`] rows.
    ///
    /// Input is validated before the database is touched.
    pub async fn run_select(
        db: &dyn Database,
        table_name: &str,
        columns: &[String],
    ) -> Result<Vec<QueryResultRow>, GatewayError> {
        Self::validate(table_name, columns)?;

        let sql = Self::build_select_sql(table_name, columns);
        let start = Instant::now();

        tracing::debug!(table = table_name, ?columns, %sql, "Executing query");

        let mut rows = db.fetch_rows(&sql, ROW_LIMIT).await.inspect_err(|e| {
            tracing::warn!(
                table = table_name,
                ?columns,
                pg_code = e.pg_code(),
                error = %e,
                "Query failed"
            );
        })?;
        rows.truncate(ROW_LIMIT);

        tracing::debug!(
            table = table_name,
            row_count = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );

        Ok(rows)
    }

    /// Check the request shape.
    pub fn validate(table_name: &str, columns: &[String]) -> Result<(), GatewayError> {
        if table_name.is_empty() {
            return Err(GatewayError::invalid_request("tableName is required"));
        }
        if columns.is_empty() {
            return Err(GatewayError::invalid_request("columns must be a non-empty array"));
        }
        if columns.iter().any(|c| c.is_empty()) {
            return Err(GatewayError::invalid_request("column names must be non-empty"));
        }
        Ok(())
    }

    /// Build the bounded `SELECT` text. Every identifier passes through
    /// [`sanitize_identifier`].
    pub fn build_select_sql(table_name: &str, columns: &[String]) -> String {
        let select_list = columns
            .iter()
            .map(|c| sanitize_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {select_list} FROM {} LIMIT {ROW_LIMIT}", sanitize_identifier(table_name))
    }
}
