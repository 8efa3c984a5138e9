//! HTTP binding: tool endpoints, health, and stats
//!
//! Error policy: `InvalidInput` maps to 400, `NotFound` to 404, every
//! internal failure to a 500 with a short generic message. Details stay in
//! the logs, never in a response body.

use std::time::Instant;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use mnemo_core::error::MemoryError;

use crate::state::AppState;

mod handlers;
mod models;

pub use models::{
    AttachBlobIn, AttachmentOut, FetchBlobIn, FetchBlobOut, LinkOut, MemoryGetIn, MemoryGetOut,
    MemoryLinkIn, MemoryOut, MemorySearchIn, MemoryWriteIn, SummarizeScopeIn,
};

/// Client-visible error with FastAPI-style `{"detail": ...}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }
}

impl From<MemoryError> for ApiError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::InvalidInput(detail) => Self::bad_request(detail),
            MemoryError::NotFound(detail) => Self::not_found(detail),
            other => {
                // Internal detail goes to the log, not the client.
                error!(error = %other, "request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    detail: "storage error".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tools/memory.write", post(handlers::memory_write))
        .route("/tools/memory.search", post(handlers::memory_search))
        .route("/tools/memory.get", post(handlers::memory_get))
        .route("/tools/memory.link", post(handlers::memory_link))
        .route(
            "/tools/memory.summarize_scope",
            post(handlers::memory_summarize_scope),
        )
        .route("/tools/memory.attach_blob", post(handlers::memory_attach_blob))
        .route("/tools/memory.fetch_blob", post(handlers::memory_fetch_blob))
        .route("/health", get(handlers::health))
        .route("/stats/:tenant_id", get(handlers::stats))
        .layer(axum::middleware::from_fn(audit_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Log every tool call with method, path, status, and latency
async fn audit_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    if path.starts_with("/tools/") {
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            %method,
            path,
            status = response.status().as_u16(),
            latency_ms = format!("{latency_ms:.1}"),
            "audit"
        );
    }
    response
}
