//! Gateway services.
//!
//! - `database` - the `Database` trait every operation goes through
//! - `connection` - PostgreSQL implementation on deadpool-postgres
//! - `values` - PostgreSQL row to JSON conversion
//! - `sanitize` - identifier sanitizer
//! - `schema` - table and column discovery
//! - `query` - bounded `SELECT` execution
//! - `export` - CSV materialization
//! - `uploads` - uploaded file storage

pub mod connection;
pub mod database;
pub mod export;
pub mod query;
pub mod sanitize;
pub mod schema;
pub mod uploads;
pub mod values;

pub use connection::{ConnectionPool, PooledConnection};
pub use database::Database;
pub use export::{csv_filename, rows_to_csv, CSV_CONTENT_TYPE};
pub use query::QueryService;
pub use sanitize::sanitize_identifier;
pub use schema::SchemaService;
pub use uploads::UploadStore;
