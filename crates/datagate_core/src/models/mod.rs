//! Data models for the Datagate gateway.
//!
//! - `connection` - ConnectionConfig, ConnectionOptions, PoolStatus
//! - `schema` - TableDescriptor, ColumnDescriptor, CatalogColumn
//! - `query` - QueryRequest, QueryResultRow, ROW_LIMIT
//! - `upload` - UploadReceipt

pub mod connection;
pub mod query;
pub mod schema;
pub mod upload;

pub use connection::{ConnectionConfig, ConnectionOptions, PoolStatus};
pub use query::{QueryRequest, QueryResultRow, ROW_LIMIT};
pub use schema::{CatalogColumn, ColumnDescriptor, TableDescriptor};
pub use upload::UploadReceipt;
