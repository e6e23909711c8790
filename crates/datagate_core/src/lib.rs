//! Core of the Datagate open-data gateway.
//!
//! - **error**: `GatewayError` and the client-facing error body
//! - **models**: descriptors, query requests, upload receipts
//! - **services**: database access, sanitizing, querying, CSV, uploads
//! - **config**: environment configuration
//! - **state**: state shared by request handlers
//! - **logging**: structured logging setup

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::GatewayConfig;
pub use error::{ErrorInfo, GatewayError};
pub use models::{
    CatalogColumn, ColumnDescriptor, ConnectionConfig, ConnectionOptions, PoolStatus,
    QueryRequest, QueryResultRow, TableDescriptor, UploadReceipt, ROW_LIMIT,
};
pub use services::{ConnectionPool, Database, QueryService, SchemaService, UploadStore};
pub use state::GatewayState;
