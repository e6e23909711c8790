//! Request handlers.
//!
//! Each handler is one async round-trip through the core services; errors
//! become [`ApiError`] responses.

use axum::body::Body;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use datagate_core::services::{csv_filename, rows_to_csv, CSV_CONTENT_TYPE};
use datagate_core::{
    ColumnDescriptor, GatewayError, GatewayState, PoolStatus, QueryRequest, QueryResultRow,
    QueryService, SchemaService, TableDescriptor, UploadReceipt,
};

use crate::error::ApiError;

/// Multipart part that carries the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

type ApiResult<T> = Result<T, ApiError>;

/// Body of `GET /health`: `ok` or `unavailable`, plus pool counters when the
/// database handle is pooled.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pool: Option<PoolStatus>,
}

/// `GET /health`
pub async fn health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthBody>) {
    let pool = state.pool_status();
    match state.db().ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthBody { status: "ok", pool })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthBody { status: "unavailable", pool }))
        }
    }
}

/// `GET /tables`
pub async fn list_tables(
    State(state): State<GatewayState>,
) -> ApiResult<Json<Vec<TableDescriptor>>> {
    let tables = SchemaService::list_tables(state.db(), state.schema()).await?;
    Ok(Json(tables))
}

/// `GET /tables/:tableName/columns`
pub async fn list_columns(
    State(state): State<GatewayState>,
    Path(table_name): Path<String>,
) -> ApiResult<Json<Vec<ColumnDescriptor>>> {
    let columns = SchemaService::list_columns(state.db(), state.schema(), &table_name).await?;
    Ok(Json(columns))
}

/// `POST /query`
pub async fn run_query(
    State(state): State<GatewayState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<QueryResultRow>>> {
    let request = query_body(body)?;
    let rows = QueryService::run(state.db(), &request).await?;
    Ok(Json(rows))
}

/// `POST /query/csv`
pub async fn run_query_csv(
    State(state): State<GatewayState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = query_body(body)?;
    let rows = QueryService::run(state.db(), &request).await?;
    let csv = rows_to_csv(&rows);

    Ok(attachment(CSV_CONTENT_TYPE, &csv_filename(&request.table_name), Body::from(csv)))
}

fn query_body(body: Result<Json<QueryRequest>, JsonRejection>) -> Result<QueryRequest, ApiError> {
    body.map(|Json(request)| request).map_err(|rejection| {
        tracing::debug!(rejection = %rejection.body_text(), "Unreadable query body");
        GatewayError::invalid_request("request body must be a JSON object with tableName and columns")
            .into()
    })
}

/// `POST /api/upload`
pub async fn upload(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadReceipt>> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(rejection = %rejection.body_text(), "Upload without multipart body");
        GatewayError::NoFileAttached
    })?;
    let limit = state.uploads().max_bytes();

    while let Some(field) =
        multipart.next_field().await.map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let mimetype = field.content_type().unwrap_or("application/octet-stream").to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;

        let receipt = state.uploads().save(&original_name, &mimetype, &bytes).await?;
        return Ok(Json(receipt));
    }

    Err(GatewayError::NoFileAttached.into())
}

fn multipart_error(err: MultipartError, limit: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return GatewayError::UploadTooLarge { limit }.into();
    }
    tracing::debug!(error = %err.body_text(), "Malformed multipart body");
    GatewayError::invalid_request("malformed multipart body").into()
}

/// `GET /api/download/:filename`
pub async fn download(
    State(state): State<GatewayState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let bytes = state.uploads().open(&filename).await?;
    Ok(attachment("application/octet-stream", &filename, Body::from(bytes)))
}

fn attachment(content_type: &str, filename: &str, body: Body) -> Response {
    let safe: String =
        filename.chars().map(|c| if c == '"' || c == '\\' { '_' } else { c }).collect();
    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{safe}\"")),
    ];
    (headers, body).into_response()
}
