//! Review workflow and statistics endpoints.

use crate::caller::RequestCaller;
use crate::error::{blocking, ApiError};
use crate::AppState;
use api_shared::wire::{
    DateRangeQuery, DateRangeStatisticsRes, MessageRes, StatisticsRes, StatusReq,
};
use axum::extract::{Path as AxumPath, Query, State};
use axum::response::Json;
use lawmark_core::{DocumentId, StatisticsService, StatusService};

pub const STATUS_UPDATED_MESSAGE: &str = "Document status updated successfully";

#[utoipa::path(
    patch,
    path = "/update_status/{document_id}/",
    params(("document_id" = i64, Path, description = "Document id")),
    request_body = StatusReq,
    responses(
        (status = 200, description = "Status changed", body = MessageRes),
        (status = 400, description = "Invalid status", body = MessageRes),
        (status = 403, description = "Caller lacks the required capability", body = MessageRes),
        (status = 404, description = "Document not found", body = MessageRes)
    )
)]
/// Moves a document through the review workflow.
///
/// Marking needs `can_mark_as_marked`, checking needs `can_mark_as_checked`, and reverting a
/// checked document needs the latter too. Nothing is written on rejection.
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    AxumPath(document_id): AxumPath<DocumentId>,
    Json(req): Json<StatusReq>,
) -> Result<Json<MessageRes>, ApiError> {
    let requested = req.label()?.to_string();
    let capabilities = caller.capabilities().clone();
    let service = StatusService::new(state.cfg.clone());
    blocking(move || service.request_transition(document_id, &requested, &capabilities)).await?;
    Ok(Json(MessageRes::new(STATUS_UPDATED_MESSAGE)))
}

#[utoipa::path(
    get,
    path = "/statistics",
    responses(
        (status = 200, description = "Aggregate counts over all documents", body = StatisticsRes)
    )
)]
#[axum::debug_handler]
pub async fn statistics(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
) -> Result<Json<StatisticsRes>, ApiError> {
    let service = StatisticsService::new(state.cfg.clone());
    let stats = blocking(move || service.document_statistics()).await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/date_range_statistics/",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Counts for the range", body = DateRangeStatisticsRes),
        (status = 400, description = "Missing or malformed date", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn date_range_statistics(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<DateRangeStatisticsRes>, ApiError> {
    let (start, end) = query.bounds()?;
    let (start, end) = (start.to_string(), end.to_string());
    let service = StatisticsService::new(state.cfg.clone());
    let stats = blocking(move || service.date_range(&start, &end)).await?;
    Ok(Json(stats.into()))
}
