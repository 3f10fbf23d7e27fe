use std::sync::Arc;

use assess_report_service::{DetailReport, PageReport, SubmitAction, SubmitReceipt, SubmitRequest};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use tokio_util::sync::CancellationToken;

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::PageQuery;

/// Token cancelled when the handler future is dropped, i.e. when the client
/// goes away before the reply is ready.
fn request_token() -> (CancellationToken, tokio_util::sync::DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

pub async fn page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageReport>, ApiError> {
    let filter = query.filter().map_err(ApiError::BadRequest)?;
    let (cancel, _guard) = request_token();
    let report = state.service.page(&filter, query.pager(), &cancel).await?;
    Ok(Json(report))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DetailReport>, ApiError> {
    let (cancel, _guard) = request_token();
    let report = state.service.get_detail(&id, &cancel).await?;
    Ok(Json(report))
}

/// `PUT /api/assessments/{id}/{draft|complete}`.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path((id, action)): Path<(String, String)>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitReceipt>, ApiError> {
    let action: SubmitAction = action.parse()?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (cancel, _guard) = request_token();
    let receipt = state.service.submit(&id, action, &request, &cancel).await?;
    tracing::info!(subject_id = %id, status = %receipt.status, "submission accepted");
    Ok(Json(receipt))
}
