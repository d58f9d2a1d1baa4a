//! Annotation endpoints.

use crate::caller::RequestCaller;
use crate::error::{blocking, ApiError};
use crate::AppState;
use api_shared::wire::{
    AnnotationListQuery, AnnotationRes, CreateAnnotationReq, ExportAnnotationRes, MessageRes,
    UpdateAnnotationReq,
};
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use lawmark_core::{AnnotationId, AnnotationService, CoreError, DocumentId};
use serde_json::Value;

fn parse_annotation_id(raw: &str) -> Result<AnnotationId, ApiError> {
    AnnotationId::parse(raw)
        .map_err(CoreError::from)
        .map_err(ApiError::from)
}

#[utoipa::path(
    get,
    path = "/annotations/",
    params(AnnotationListQuery),
    responses(
        (status = 200, description = "Annotations, oldest first", body = Vec<AnnotationRes>)
    )
)]
#[axum::debug_handler]
pub async fn list_annotations(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    Query(query): Query<AnnotationListQuery>,
) -> Result<Json<Vec<AnnotationRes>>, ApiError> {
    let service = AnnotationService::new(state.cfg.clone());
    let annotations = blocking(move || service.list(query.document)).await?;
    Ok(Json(annotations.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/annotations/",
    request_body = CreateAnnotationReq,
    responses(
        (status = 201, description = "Annotation created", body = AnnotationRes),
        (status = 400, description = "Bad span, label or duplicate id", body = MessageRes),
        (status = 404, description = "Document not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn create_annotation(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    Json(req): Json<CreateAnnotationReq>,
) -> Result<(StatusCode, Json<AnnotationRes>), ApiError> {
    caller.require_username()?;
    let new = req.into_new_annotation()?;
    let service = AnnotationService::new(state.cfg.clone());
    let annotation = blocking(move || service.create(new)).await?;
    Ok((StatusCode::CREATED, Json(annotation.into())))
}

#[utoipa::path(
    get,
    path = "/annotations/{id}/",
    params(("id" = String, Path, description = "Annotation UUID")),
    responses(
        (status = 200, description = "The annotation", body = AnnotationRes),
        (status = 400, description = "Malformed id", body = MessageRes),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn get_annotation(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<AnnotationRes>, ApiError> {
    let id = parse_annotation_id(&id)?;
    let service = AnnotationService::new(state.cfg.clone());
    let annotation = blocking(move || service.get(id)).await?;
    Ok(Json(annotation.into()))
}

#[utoipa::path(
    patch,
    path = "/annotations/{id}/",
    params(("id" = String, Path, description = "Annotation UUID")),
    request_body = UpdateAnnotationReq,
    responses(
        (status = 200, description = "Annotation updated", body = AnnotationRes),
        (status = 400, description = "Bad span or label", body = MessageRes),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn update_annotation(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateAnnotationReq>,
) -> Result<Json<AnnotationRes>, ApiError> {
    caller.require_username()?;
    let id = parse_annotation_id(&id)?;
    let changes = req.into_changes()?;
    let service = AnnotationService::new(state.cfg.clone());
    let annotation = blocking(move || service.update(id, changes)).await?;
    Ok(Json(annotation.into()))
}

#[utoipa::path(
    delete,
    path = "/annotations/{id}/",
    params(("id" = String, Path, description = "Annotation UUID")),
    responses(
        (status = 204, description = "Annotation deleted"),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_annotation(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    caller.require_username()?;
    let id = parse_annotation_id(&id)?;
    let service = AnnotationService::new(state.cfg.clone());
    blocking(move || service.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/annotations_list/{document_id}",
    params(("document_id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Raw json_data payloads of the document's annotations"),
        (status = 404, description = "Document not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn annotation_payloads(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    AxumPath(document_id): AxumPath<DocumentId>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let service = AnnotationService::new(state.cfg.clone());
    let payloads = blocking(move || service.payloads(document_id)).await?;
    Ok(Json(payloads))
}

#[utoipa::path(
    get,
    path = "/export_annotations/",
    responses(
        (status = 200, description = "All annotations", body = Vec<ExportAnnotationRes>)
    )
)]
#[axum::debug_handler]
pub async fn export_annotations(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
) -> Result<Json<Vec<ExportAnnotationRes>>, ApiError> {
    let service = AnnotationService::new(state.cfg.clone());
    let annotations = blocking(move || service.list(None)).await?;
    Ok(Json(annotations.into_iter().map(Into::into).collect()))
}
