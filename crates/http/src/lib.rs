//! HTTP API server for assess-report.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]
#![allow(clippy::single_call_fn, reason = "Helper functions improve readability")]

pub mod api_error;
mod api_types;
mod handlers;
mod query_types;


use std::sync::Arc;

use assess_report_service::ReportService;
use axum::routing::{get, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

pub use api_types::{HealthResponse, VersionResponse};
pub use query_types::PageQuery;

/// Shared application state for all HTTP handlers.
pub struct AppState {
    pub service: ReportService,
}

impl AppState {
    #[must_use]
    pub fn new(service: ReportService) -> Arc<Self> {
        Arc::new(Self { service })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/api/assessments", get(handlers::assessments::page))
        .route("/api/assessments/{id}", get(handlers::assessments::detail))
        .route("/api/assessments/{id}/{action}", put(handlers::assessments::submit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}
