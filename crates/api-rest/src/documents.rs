//! Document, classifier, search, export and NPA catalogue endpoints.

use crate::caller::RequestCaller;
use crate::error::{blocking, ApiError};
use crate::AppState;
use api_shared::wire::{
    ClassifierReq, ClassifierRes, CreateDocumentReq, DocumentPageRes, DocumentRes,
    ExportDocumentRes, MessageRes, NpaListRes, PageQuery, SearchQuery, SearchRes,
    UpdateDocumentReq,
};
use axum::extract::{Path as AxumPath, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use lawmark_core::{DocumentChanges, DocumentId, DocumentService, SearchService};

async fn apply_changes(
    state: &AppState,
    id: DocumentId,
    changes: DocumentChanges,
) -> Result<lawmark_core::Document, ApiError> {
    let service = DocumentService::new(state.cfg.clone());
    let outcome = blocking(move || service.update(id, changes)).await?;
    Ok(outcome.document)
}

#[utoipa::path(
    get,
    path = "/documents/",
    params(PageQuery),
    responses(
        (status = 200, description = "A page of documents, newest first", body = DocumentPageRes),
        (status = 404, description = "Invalid page", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn list_documents(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    Query(query): Query<PageQuery>,
) -> Result<Json<DocumentPageRes>, ApiError> {
    let page = query.page_request()?;
    let service = DocumentService::new(state.cfg.clone());
    let result = blocking(move || service.list(page)).await?;
    let info = result
        .page
        .ok_or_else(|| ApiError::Internal("document listing returned no page".into()))?;
    Ok(Json(DocumentPageRes::new(result, info)))
}

#[utoipa::path(
    post,
    path = "/documents/",
    request_body = CreateDocumentReq,
    responses(
        (status = 201, description = "Document created", body = DocumentRes),
        (status = 400, description = "Bad request", body = MessageRes),
        (status = 401, description = "No caller identity", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn create_document(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    Json(req): Json<CreateDocumentReq>,
) -> Result<(StatusCode, Json<DocumentRes>), ApiError> {
    let owner = caller.require_username()?.to_string();
    let new = req.into_new_document()?;
    let service = DocumentService::new(state.cfg.clone());
    let document = blocking(move || service.create(&owner, new)).await?;
    Ok((StatusCode::CREATED, Json(document.into())))
}

#[utoipa::path(
    get,
    path = "/documents/{id}/",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "The document", body = DocumentRes),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn get_document(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    AxumPath(id): AxumPath<DocumentId>,
) -> Result<Json<DocumentRes>, ApiError> {
    let service = DocumentService::new(state.cfg.clone());
    let document = blocking(move || service.get(id)).await?;
    Ok(Json(document.into()))
}

#[utoipa::path(
    put,
    path = "/documents/{id}/",
    params(("id" = i64, Path, description = "Document id")),
    request_body = CreateDocumentReq,
    responses(
        (status = 200, description = "Document replaced", body = DocumentRes),
        (status = 400, description = "Bad request", body = MessageRes),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn replace_document(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    AxumPath(id): AxumPath<DocumentId>,
    Json(req): Json<CreateDocumentReq>,
) -> Result<Json<DocumentRes>, ApiError> {
    caller.require_username()?;
    let document = apply_changes(&state, id, req.into_changes()?).await?;
    Ok(Json(document.into()))
}

#[utoipa::path(
    patch,
    path = "/documents/{id}/",
    params(("id" = i64, Path, description = "Document id")),
    request_body = UpdateDocumentReq,
    responses(
        (status = 200, description = "Document updated", body = DocumentRes),
        (status = 400, description = "Bad request", body = MessageRes),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
/// Applies a partial update. A changed text purges the document's annotations.
#[axum::debug_handler]
pub async fn update_document(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    AxumPath(id): AxumPath<DocumentId>,
    Json(req): Json<UpdateDocumentReq>,
) -> Result<Json<DocumentRes>, ApiError> {
    caller.require_username()?;
    let document = apply_changes(&state, id, req.into_changes()?).await?;
    Ok(Json(document.into()))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}/",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 204, description = "Document and its annotations deleted"),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_document(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    AxumPath(id): AxumPath<DocumentId>,
) -> Result<StatusCode, ApiError> {
    caller.require_username()?;
    let service = DocumentService::new(state.cfg.clone());
    blocking(move || service.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/documents/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching documents with the exact total", body = SearchRes),
        (status = 400, description = "Malformed date", body = MessageRes),
        (status = 404, description = "Invalid page", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn search_documents(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchRes>, ApiError> {
    let service = SearchService::new(state.cfg.clone());
    let page = if service.pagination_enabled() {
        Some(query.page_request()?)
    } else {
        None
    };
    let criteria = query.criteria();
    let result = blocking(move || service.search(&criteria, page)).await?;
    Ok(Json(result.into()))
}

#[utoipa::path(
    get,
    path = "/classifiers/{id}/",
    params(("id" = i64, Path, description = "Document id")),
    responses(
        (status = 200, description = "Classification of the document", body = ClassifierRes),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn get_classifier(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
    AxumPath(id): AxumPath<DocumentId>,
) -> Result<Json<ClassifierRes>, ApiError> {
    let service = DocumentService::new(state.cfg.clone());
    let document = blocking(move || service.get(id)).await?;
    Ok(Json(document.into()))
}

#[utoipa::path(
    patch,
    path = "/classifiers/{id}/",
    params(("id" = i64, Path, description = "Document id")),
    request_body = ClassifierReq,
    responses(
        (status = 200, description = "Classification updated", body = ClassifierRes),
        (status = 400, description = "Bad request", body = MessageRes),
        (status = 404, description = "Not found", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn update_classifier(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    AxumPath(id): AxumPath<DocumentId>,
    Json(req): Json<ClassifierReq>,
) -> Result<Json<ClassifierRes>, ApiError> {
    caller.require_username()?;
    let document = apply_changes(&state, id, req.into_changes()?).await?;
    Ok(Json(document.into()))
}

#[utoipa::path(
    get,
    path = "/export_all/",
    responses(
        (status = 200, description = "Documents with annotations", body = Vec<ExportDocumentRes>)
    )
)]
#[axum::debug_handler]
pub async fn export_all(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
) -> Result<Json<Vec<ExportDocumentRes>>, ApiError> {
    let service = DocumentService::new(state.cfg.clone());
    let exported = blocking(move || service.export_all()).await?;
    Ok(Json(exported.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/npa_list/",
    responses(
        (status = 200, description = "The configured NPA catalogue", body = NpaListRes)
    )
)]
#[axum::debug_handler]
pub async fn npa_list(
    State(state): State<AppState>,
    RequestCaller(_caller): RequestCaller,
) -> Json<NpaListRes> {
    Json(NpaListRes::from(state.cfg.npa_catalogue()))
}
