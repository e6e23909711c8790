//! CSV materialization of query results.
//!
//! The format is deliberately simple: the header is the first row's keys
//! joined by commas, and every cell is the value's compact JSON text. Strings
//! therefore arrive double-quoted (keeping embedded commas intact) but embedded
//! quotes are backslash-escaped rather than doubled, so this is not RFC 4180.

use serde_json::Value as JsonValue;

use crate::models::QueryResultRow;

/// Content type used for CSV downloads.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Serialize rows to CSV. Zero rows yield an empty string.
pub fn rows_to_csv(rows: &[QueryResultRow]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let header: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.join(","));

    for row in rows {
        let cells: Vec<String> =
            header.iter().map(|key| row.get(*key).map(json_cell).unwrap_or_default()).collect();
        lines.push(cells.join(","));
    }

    lines.join("\n")
}

fn json_cell(value: &JsonValue) -> String {
    // Serializing a Value cannot fail
    serde_json::to_string(value).unwrap_or_default()
}

/// Download name for a table export: the sanitized table name plus `.csv`.
pub fn csv_filename(table_name: &str) -> String {
    let stem: String =
        table_name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect();
    if stem.is_empty() {
        "export.csv".to_string()
    } else {
        format!("{stem}.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: JsonValue) -> Vec<QueryResultRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_csv_shape() {
        let rows = rows(json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y,z"}]));
        assert_eq!(rows_to_csv(&rows), "a,b\n1,\"x\"\n2,\"y,z\"");
    }

    #[test]
    fn test_csv_empty() {
        assert_eq!(rows_to_csv(&[]), "");
    }

    #[test]
    fn test_csv_scalar_forms() {
        let rows = rows(json!([
            {"n": null, "t": true, "f": 1.5, "s": "diz \"oi\"", "j": {"k": [1, 2]}}
        ]));
        assert_eq!(
            rows_to_csv(&rows),
            "n,t,f,s,j\nnull,true,1.5,\"diz \\\"oi\\\"\",{\"k\":[1,2]}"
        );
    }

    #[test]
    fn test_csv_header_follows_first_row() {
        let rows = rows(json!([{"a": 1}, {"b": 2, "a": 3}]));
        assert_eq!(rows_to_csv(&rows), "a\n1\n3");

        let rows = rows_with_missing();
        assert_eq!(rows_to_csv(&rows), "a,b\n1,2\n3,");
    }

    fn rows_with_missing() -> Vec<QueryResultRow> {
        rows(json!([{"a": 1, "b": 2}, {"a": 3}]))
    }

    #[test]
    fn test_csv_filename() {
        assert_eq!(csv_filename("escolas_municipais"), "escolas_municipais.csv");
        assert_eq!(csv_filename("a/../b"), "ab.csv");
        assert_eq!(csv_filename("\";"), "export.csv");
    }
}
