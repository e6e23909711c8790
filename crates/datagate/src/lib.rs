//! Datagate HTTP API.
//!
//! Routes:
//! - `GET  /health`
//! - `GET  /tables`
//! - `GET  /tables/:tableName/columns`
//! - `POST /query`
//! - `POST /query/csv`
//! - `POST /api/upload`
//! - `GET  /api/download/:filename`

pub mod error;
pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use datagate_core::GatewayState;

pub use error::ApiError;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Build the application router over `state`.
pub fn build_router(state: GatewayState) -> Router {
    let upload_limit = state
        .uploads()
        .max_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES)
        .try_into()
        .unwrap_or(usize::MAX);

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/tables", get(handlers::list_tables))
        .route("/tables/:tableName/columns", get(handlers::list_columns))
        .route("/query", post(handlers::run_query))
        .route("/query/csv", post(handlers::run_query_csv))
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/download/:filename", get(handlers::download))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
