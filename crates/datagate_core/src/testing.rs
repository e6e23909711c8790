//! In-memory [`Database`] for tests.
//!
//! Understands exactly the statements the query executor builds
//! (`SELECT "c1", "c2" FROM "t" LIMIT n`) and records every statement it is
//! asked to run.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::GatewayError;
use crate::models::{CatalogColumn, QueryResultRow};
use crate::services::database::Database;

struct MemoryTable {
    name: String,
    columns: Vec<CatalogColumn>,
    rows: Vec<QueryResultRow>,
}

/// Fake database holding a fixed set of tables.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Vec<MemoryTable>,
    executed: Mutex<Vec<String>>,
    calls: AtomicUsize,
    unavailable: bool,
}

impl MemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with its catalog columns and row data.
    pub fn with_table(
        mut self,
        name: impl Into<String>,
        columns: Vec<CatalogColumn>,
        rows: Vec<QueryResultRow>,
    ) -> Self {
        self.tables.push(MemoryTable { name: name.into(), columns, rows });
        self
    }

    /// Make every operation fail as if the server were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Statements passed to `fetch_rows`, in call order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    /// Number of trait calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(GatewayError::storage_unavailable("connection refused"));
        }
        Ok(())
    }

    fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

fn undefined(kind: &str, name: &str, code: &str) -> GatewayError {
    GatewayError::QueryExecutionFailed {
        message: format!("{kind} \"{name}\" does not exist"),
        code: Some(code.to_string()),
        detail: None,
        source: None,
    }
}

fn unquote(identifier: &str) -> Result<&str, GatewayError> {
    let trimmed = identifier.trim();
    let inner = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| GatewayError::query_failed(format!("syntax error at {trimmed}")))?;
    if inner.is_empty() {
        return Err(GatewayError::QueryExecutionFailed {
            message: "zero-length delimited identifier".to_string(),
            code: Some("42601".to_string()),
            detail: None,
            source: None,
        });
    }
    Ok(inner)
}

/// Split `SELECT <cols> FROM <table> LIMIT <n>` into its identifiers.
fn parse_select(sql: &str) -> Result<(Vec<&str>, &str), GatewayError> {
    let syntax = || GatewayError::query_failed(format!("syntax error in {sql}"));
    let rest = sql.strip_prefix("SELECT ").ok_or_else(syntax)?;
    let (cols, rest) = rest.split_once(" FROM ").ok_or_else(syntax)?;
    let (table, _limit) = rest.split_once(" LIMIT ").ok_or_else(syntax)?;

    let columns = cols.split(',').map(unquote).collect::<Result<Vec<_>, _>>()?;
    Ok((columns, unquote(table)?))
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn list_table_names(&self, _schema: &str) -> Result<Vec<String>, GatewayError> {
        self.enter()?;
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn list_columns(
        &self,
        _schema: &str,
        table: &str,
    ) -> Result<Vec<CatalogColumn>, GatewayError> {
        self.enter()?;
        Ok(self.table(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn fetch_rows(
        &self,
        sql: &str,
        max_rows: usize,
    ) -> Result<Vec<QueryResultRow>, GatewayError> {
        self.enter()?;
        self.executed.lock().push(sql.to_string());

        let (columns, table_name) = parse_select(sql)?;
        let table =
            self.table(table_name).ok_or_else(|| undefined("relation", table_name, "42P01"))?;
        for column in &columns {
            if !table.columns.iter().any(|c| c.name == *column) {
                return Err(undefined("column", column, "42703"));
            }
        }

        Ok(table
            .rows
            .iter()
            .take(max_rows)
            .map(|row| {
                columns
                    .iter()
                    .map(|c| (c.to_string(), row.get(*c).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        self.enter()
    }
}
