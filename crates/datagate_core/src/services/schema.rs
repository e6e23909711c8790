//! Schema discovery service.
//!
//! Lists what a client may query: the tables of the configured schema, then the
//! columns of whichever table is selected. Split in two calls so the client
//! never downloads the whole catalog.

use std::time::Instant;

use crate::error::GatewayError;
use crate::models::{ColumnDescriptor, TableDescriptor};
use crate::services::database::Database;

/// Schema discovery service.
pub struct SchemaService;

impl SchemaService {
    /// List the tables of `schema` as picker descriptors.
    pub async fn list_tables(
        db: &dyn Database,
        schema: &str,
    ) -> Result<Vec<TableDescriptor>, GatewayError> {
        let start = Instant::now();
        let names = db.list_table_names(schema).await.inspect_err(|e| {
            tracing::error!(schema, error = %e, "Table discovery failed");
        })?;

        tracing::debug!(
            schema,
            table_count = names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tables listed"
        );

        Ok(names.into_iter().map(TableDescriptor::from_table_name).collect())
    }

    /// List the columns of `table`. An unknown table yields an empty list.
    pub async fn list_columns(
        db: &dyn Database,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, GatewayError> {
        let start = Instant::now();
        let columns = db.list_columns(schema, table).await.inspect_err(|e| {
            tracing::error!(schema, table, error = %e, "Column discovery failed");
        })?;

        tracing::debug!(
            schema,
            table,
            column_count = columns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Columns listed"
        );

        Ok(columns.into_iter().map(ColumnDescriptor::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogColumn;
    use crate::testing::MemoryDatabase;
    use std::collections::HashSet;

    fn sample_db() -> MemoryDatabase {
        MemoryDatabase::new()
            .with_table(
                "escolas_municipais",
                vec![CatalogColumn::new("nome", "text"), CatalogColumn::new("total_alunos", "integer")],
                Vec::new(),
            )
            .with_table("bairros", vec![CatalogColumn::new("nome", "text")], Vec::new())
    }

    #[tokio::test]
    async fn test_list_tables_builds_descriptors() {
        let db = sample_db();
        let tables = SchemaService::list_tables(&db, "public").await.unwrap();

        let names: HashSet<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, HashSet::from(["escolas_municipais", "bairros"]));

        let escolas = tables.iter().find(|t| t.name == "escolas_municipais").unwrap();
        assert_eq!(escolas.display_name, "Escolas Municipais");
    }

    #[tokio::test]
    async fn test_list_tables_is_idempotent() {
        let db = sample_db();
        let first: HashSet<_> =
            SchemaService::list_tables(&db, "public").await.unwrap().into_iter().collect();
        let second: HashSet<_> =
            SchemaService::list_tables(&db, "public").await.unwrap().into_iter().collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_columns_in_catalog_order() {
        let db = sample_db();
        let columns =
            SchemaService::list_columns(&db, "public", "escolas_municipais").await.unwrap();

        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["nome", "total_alunos"]);
        assert_eq!(columns[1].data_type, "integer");
        assert_eq!(columns[1].display_name, "total alunos");
    }

    #[tokio::test]
    async fn test_list_columns_unknown_table_is_empty() {
        let db = sample_db();
        let columns =
            SchemaService::list_columns(&db, "public", "nonexistent_table_xyz").await.unwrap();
        assert!(columns.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_database_fails_discovery() {
        let db = sample_db().unavailable();

        let err = SchemaService::list_tables(&db, "public").await.unwrap_err();
        assert!(matches!(err, GatewayError::StorageUnavailable { .. }));

        let err = SchemaService::list_columns(&db, "public", "bairros").await.unwrap_err();
        assert!(matches!(err, GatewayError::StorageUnavailable { .. }));
    }
}
