//! Query request and result models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Maximum number of rows a single query may return.
///
/// Fixed bound; clients cannot raise it.
pub const ROW_LIMIT: usize = 1000;

/// A single result row: column name to driver-native value, in `SELECT` order.
pub type QueryResultRow = Map<String, JsonValue>;

/// Client-submitted query over one table.
///
/// Missing fields deserialize as empty so the executor, not the JSON parser,
/// reports which field is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Table to read from.
    #[serde(default)]
    pub table_name: String,
    /// Columns to select, in output order.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Sent by some UI variants. Accepted and ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_codes: Option<bool>,
}

impl QueryRequest {
    /// Create a request for the given table and columns.
    pub fn new<I, S>(table_name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table_name: table_name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            translate_codes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: QueryRequest = serde_json::from_str(
            r#"{"tableName":"escolas","columns":["nome","bairro"],"translateCodes":true}"#,
        )
        .unwrap();
        assert_eq!(request.table_name, "escolas");
        assert_eq!(request.columns, vec!["nome", "bairro"]);
        assert_eq!(request.translate_codes, Some(true));
    }

    #[test]
    fn test_request_missing_fields_default_to_empty() {
        let request: QueryRequest = serde_json::from_str("{}").unwrap();
        assert!(request.table_name.is_empty());
        assert!(request.columns.is_empty());
        assert_eq!(request.translate_codes, None);
    }
}
