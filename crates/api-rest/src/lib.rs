//! # API REST
//!
//! REST API implementation for Lawmark.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, gateway headers)
//!
//! Uses `api-shared` for wire types and caller identification. All rules live in
//! `lawmark-core`; handlers only translate between HTTP and core calls.

#![warn(rust_2018_idioms)]

mod annotations;
mod caller;
mod documents;
pub mod error;
mod review;

use api_shared::{wire, HealthRes, HealthService};
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, patch};
use axum::Router;
use lawmark_core::CoreConfig;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use review::STATUS_UPDATED_MESSAGE;

/// Application state for the REST API server
///
/// Services are cheap to build from the shared config, so handlers construct them per request.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    /// Gateway key every request must present in `x-api-key`; `None` disables the check.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, api_key: Option<String>) -> Self {
        Self {
            cfg,
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        documents::list_documents,
        documents::create_document,
        documents::get_document,
        documents::replace_document,
        documents::update_document,
        documents::delete_document,
        documents::search_documents,
        documents::get_classifier,
        documents::update_classifier,
        documents::export_all,
        documents::npa_list,
        annotations::list_annotations,
        annotations::create_annotation,
        annotations::get_annotation,
        annotations::update_annotation,
        annotations::delete_annotation,
        annotations::annotation_payloads,
        annotations::export_annotations,
        review::update_status,
        review::statistics,
        review::date_range_statistics,
    ),
    components(schemas(
        HealthRes,
        wire::MessageRes,
        wire::DocumentRes,
        wire::CreateDocumentReq,
        wire::UpdateDocumentReq,
        wire::DocumentPageRes,
        wire::DocumentListRes,
        wire::SearchRes,
        wire::ClassifierRes,
        wire::ClassifierReq,
        wire::StatusReq,
        wire::AnnotationRes,
        wire::CreateAnnotationReq,
        wire::UpdateAnnotationReq,
        wire::ExportAnnotationRes,
        wire::ExportDocumentRes,
        wire::NpaListRes,
        wire::StatisticsRes,
        wire::DateRangeStatisticsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router, Swagger UI included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/documents/",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/documents/search", get(documents::search_documents))
        .route("/documents/search/", get(documents::search_documents))
        .route(
            "/documents/:id/",
            get(documents::get_document)
                .put(documents::replace_document)
                .patch(documents::update_document)
                .delete(documents::delete_document),
        )
        .route(
            "/classifiers/:id/",
            get(documents::get_classifier).patch(documents::update_classifier),
        )
        .route(
            "/annotations/",
            get(annotations::list_annotations).post(annotations::create_annotation),
        )
        .route(
            "/annotations/:id/",
            get(annotations::get_annotation)
                .patch(annotations::update_annotation)
                .delete(annotations::delete_annotation),
        )
        .route(
            "/annotations_list/:document_id",
            get(annotations::annotation_payloads),
        )
        .route("/update_status/:document_id/", patch(review::update_status))
        .route("/export_all/", get(documents::export_all))
        .route("/export_annotations/", get(annotations::export_annotations))
        .route("/npa_list/", get(documents::npa_list))
        .route("/statistics", get(review::statistics))
        .route("/date_range_statistics/", get(review::date_range_statistics))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used by monitoring and load balancers, so it never checks the API key.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}
