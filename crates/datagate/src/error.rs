//! HTTP mapping for [`GatewayError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use datagate_core::GatewayError;

/// Handler error: a [`GatewayError`] rendered as `{"error", "message"}`.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl ApiError {
    /// Status code for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::InvalidRequest { .. } | GatewayError::NoFileAttached => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::FileNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::StorageUnavailable { .. }
            | GatewayError::QueryExecutionFailed { .. }
            | GatewayError::UploadFailed { .. }
            | GatewayError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = &self.0;
        let source = std::error::Error::source(err).map(|s| s.to_string());

        if err.is_client_error() {
            tracing::warn!(
                status = status.as_u16(),
                kind = err.kind(),
                error = %err,
                "Request rejected"
            );
        } else {
            tracing::error!(
                status = status.as_u16(),
                kind = err.kind(),
                pg_code = err.pg_code(),
                error = %err,
                source = source.as_deref(),
                "Request failed"
            );
        }

        (status, Json(err.to_error_info())).into_response()
    }
}
