//! Error types for the Datagate gateway.
//!
//! Every database-facing operation converts driver errors into one of these
//! kinds at its boundary. The full error (source chain, SQLSTATE, detail) is
//! for server-side logs only; clients receive [`GatewayError::client_message`].

use thiserror::Error;

/// Main error type for the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or missing request input.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Which field is missing or malformed.
        message: String,
    },

    /// The database cannot be reached or a catalog query failed.
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The constructed `SELECT` failed at the database.
    #[error("Query execution failed: {message}")]
    QueryExecutionFailed {
        /// PostgreSQL error message.
        message: String,
        /// PostgreSQL error code (e.g., "42P01").
        code: Option<String>,
        /// Additional detail from PostgreSQL.
        detail: Option<String>,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Download requested for a file that is not in the upload directory.
    #[error("File not found: {filename}")]
    FileNotFound {
        /// Requested file name, as received.
        filename: String,
    },

    /// Upload request carried no `file` part.
    #[error("No file attached")]
    NoFileAttached,

    /// Uploaded file is larger than the configured cap.
    #[error("Upload exceeds {limit} bytes")]
    UploadTooLarge {
        /// Configured cap in bytes.
        limit: u64,
    },

    /// Writing or reading the upload directory failed.
    #[error("Upload storage error: {message}")]
    UploadFailed {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error (startup only).
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },
}

impl GatewayError {
    // ========== Constructors ==========

    /// Create a new invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Create a new storage unavailable error.
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable { message: message.into(), source: None }
    }

    /// Create a new storage unavailable error with source.
    pub fn storage_unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::StorageUnavailable { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new query execution error without driver details.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryExecutionFailed { message: message.into(), code: None, detail: None, source: None }
    }

    /// Create a file not found error.
    pub fn file_not_found(filename: impl Into<String>) -> Self {
        Self::FileNotFound { filename: filename.into() }
    }

    /// Create a new upload storage error with source.
    pub fn upload_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::UploadFailed { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    // ========== Boundary conversions ==========

    /// Map a driver error raised while reading catalog metadata.
    pub fn from_catalog_error(context: &str, err: tokio_postgres::Error) -> Self {
        let message = match err.as_db_error() {
            Some(db_err) => format!("{context}: {}", db_err.message()),
            None => format!("{context}: {err}"),
        };
        Self::StorageUnavailable { message, source: Some(Box::new(err)) }
    }

    /// Map a driver error raised while executing a constructed `SELECT`.
    ///
    /// Connection-level failures (closed connection, SQLSTATE class 08) are
    /// reported as [`GatewayError::StorageUnavailable`].
    pub fn from_select_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let code = db_err.code().code().to_string();
            if code.starts_with("08") {
                return Self::StorageUnavailable {
                    message: db_err.message().to_string(),
                    source: Some(Box::new(err)),
                };
            }
            return Self::QueryExecutionFailed {
                message: db_err.message().to_string(),
                code: Some(code),
                detail: db_err.detail().map(String::from),
                source: Some(Box::new(err)),
            };
        }

        if err.is_closed() {
            return Self::StorageUnavailable {
                message: "Connection closed".to_string(),
                source: Some(Box::new(err)),
            };
        }

        Self::QueryExecutionFailed {
            message: err.to_string(),
            code: None,
            detail: None,
            source: Some(Box::new(err)),
        }
    }

    // ========== Methods ==========

    /// Get the error kind name used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "InvalidRequest",
            Self::StorageUnavailable { .. } => "StorageUnavailable",
            Self::QueryExecutionFailed { .. } => "QueryExecutionFailed",
            Self::FileNotFound { .. } => "FileNotFound",
            Self::NoFileAttached => "NoFileAttached",
            Self::UploadTooLarge { .. } => "UploadTooLarge",
            Self::UploadFailed { .. } => "UploadFailed",
            Self::Config { .. } => "Config",
        }
    }

    /// Whether the error was caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::FileNotFound { .. }
                | Self::NoFileAttached
                | Self::UploadTooLarge { .. }
        )
    }

    /// Message that is safe to send to the client.
    ///
    /// Never contains driver text, schema names or filesystem paths.
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest { message } => message.clone(),
            Self::StorageUnavailable { .. } => "Failed to read from the database".to_string(),
            Self::QueryExecutionFailed { .. } => "Failed to execute the query".to_string(),
            Self::FileNotFound { .. } => "File not found".to_string(),
            Self::NoFileAttached => "No file was attached to the request".to_string(),
            Self::UploadTooLarge { limit } => format!("File exceeds the {limit} byte upload limit"),
            Self::UploadFailed { .. } => "Failed to store the uploaded file".to_string(),
            Self::Config { .. } => "Server misconfigured".to_string(),
        }
    }

    /// Get PostgreSQL error code (if applicable).
    pub fn pg_code(&self) -> Option<&str> {
        match self {
            Self::QueryExecutionFailed { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Convert to the body sent to clients.
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo { error: self.kind().to_string(), message: self.client_message() }
    }
}

/// Client-facing error body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorInfo {
    /// Error kind (e.g., "QueryExecutionFailed").
    pub error: String,
    /// Generic, kind-appropriate message.
    pub message: String,
}

/// Convert from std::io::Error raised by the upload directory.
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::UploadFailed { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_driver_detail() {
        let err = GatewayError::QueryExecutionFailed {
            message: "relation \"secret_table\" does not exist".to_string(),
            code: Some("42P01".to_string()),
            detail: None,
            source: None,
        };

        let info = err.to_error_info();
        assert_eq!(info.error, "QueryExecutionFailed");
        assert!(!info.message.contains("secret_table"));
        assert_eq!(err.pg_code(), Some("42P01"));
    }

    #[test]
    fn test_invalid_request_message_is_forwarded() {
        let err = GatewayError::invalid_request("tableName is required");
        assert_eq!(err.client_message(), "tableName is required");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_storage_unavailable_is_server_error() {
        let err = GatewayError::storage_unavailable("pool closed");
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "StorageUnavailable");
        assert!(!err.client_message().contains("pool"));
    }

    #[test]
    fn test_io_error_maps_to_upload_failed() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/srv/uploads denied");
        let err = GatewayError::from(io);
        assert_eq!(err.kind(), "UploadFailed");
        assert!(!err.client_message().contains("/srv"));
    }
}
