//! Schema discovery models.
//!
//! Descriptors are rebuilt from catalog metadata on every request; nothing here
//! is cached.

use serde::{Deserialize, Serialize};

/// A queryable table, as shown in the table picker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    /// Same as `name`.
    pub id: String,
    /// Literal catalog table name. Authoritative for execution.
    pub name: String,
    /// Cosmetic label (underscores to spaces, title-cased).
    pub display_name: String,
    /// Generated label.
    pub description: String,
}

impl TableDescriptor {
    /// Build a descriptor from a catalog table name.
    pub fn from_table_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            display_name: title_case(&name.replace('_', " ")),
            description: format!("Tabela {name}"),
            name,
        }
    }
}

/// A column of a table, as shown in the column picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Same as `name`.
    pub id: String,
    /// Literal catalog column name.
    pub name: String,
    /// Underscores replaced by spaces.
    pub display_name: String,
    /// Catalog-reported type name. Opaque display string.
    #[serde(rename = "type")]
    pub data_type: String,
    /// Generated label.
    pub description: String,
}

impl From<CatalogColumn> for ColumnDescriptor {
    fn from(column: CatalogColumn) -> Self {
        Self {
            id: column.name.clone(),
            display_name: column.name.replace('_', " "),
            description: format!("Coluna {}", column.name),
            data_type: column.data_type,
            name: column.name,
        }
    }
}

/// A column row read from `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    /// Column name.
    pub name: String,
    /// Data type as reported by the catalog (e.g., "integer", "character varying").
    pub data_type: String,
}

impl CatalogColumn {
    /// Create a catalog column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self { name: name.into(), data_type: data_type.into() }
    }
}

/// Upper-case the first character of every ASCII word run (`[A-Za-z0-9_]`).
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_word = false;
    for ch in text.chars() {
        let is_word = ch.is_ascii_alphanumeric() || ch == '_';
        if is_word && !prev_is_word {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        prev_is_word = is_word;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_descriptor_labels() {
        let table = TableDescriptor::from_table_name("indicadores_saude_2023");
        assert_eq!(table.id, "indicadores_saude_2023");
        assert_eq!(table.name, "indicadores_saude_2023");
        assert_eq!(table.display_name, "Indicadores Saude 2023");
        assert_eq!(table.description, "Tabela indicadores_saude_2023");
    }

    #[test]
    fn test_title_case_word_boundaries() {
        assert_eq!(title_case("bairro-zona norte"), "Bairro-Zona Norte");
        assert_eq!(title_case("2020dados"), "2020dados");
        assert_eq!(title_case(""), "");
        // Non-ASCII letters are not word characters.
        assert_eq!(title_case("éscola"), "éScola");
    }

    #[test]
    fn test_column_descriptor_from_catalog() {
        let column = ColumnDescriptor::from(CatalogColumn::new("data_registro", "date"));
        assert_eq!(column.id, "data_registro");
        assert_eq!(column.display_name, "data registro");
        assert_eq!(column.data_type, "date");
        assert_eq!(column.description, "Coluna data_registro");
    }

    #[test]
    fn test_column_descriptor_json_shape() {
        let column = ColumnDescriptor::from(CatalogColumn::new("populacao", "integer"));
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "populacao",
                "name": "populacao",
                "displayName": "populacao",
                "type": "integer",
                "description": "Coluna populacao"
            })
        );
    }
}
