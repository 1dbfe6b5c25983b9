//! HTTP surface: thin axum routing over the services.
//!
//! Handlers are generic over [`RestStateDef`] so the binary wires concrete
//! implementations while tests can plug mocks. This layer is the only
//! translator from [`ServiceError`] to HTTP status codes.

use std::sync::Arc;

use axum::{
    body::Body,
    response::Response,
    routing::get,
    Router,
};
use service::csv_export::CsvExportService;
use service::csv_import::CsvImportService;
use service::danlon_api::DanlonApiService;
use service::danlon_oauth::DanlonOauthService;
use service::ftz_api::FtzApiService;
use service::mapping::MappingService;
use service::preview::PreviewCacheService;
use service::processing::ProcessingService;
use service::sync::SyncService;
use service::ServiceError;
use utoipa::OpenApi;

pub mod danlon;
pub mod ftz;
pub mod preview;

/// Placeholder identity until a real login flow exists.
pub const DEMO_USER_ID: &str = "demo_user";

pub trait RestStateDef: Clone + Send + Sync + 'static {
    type CsvImportService: CsvImportService + Send + Sync + 'static;
    type ProcessingService: ProcessingService + Send + Sync + 'static;
    type PreviewCacheService: PreviewCacheService + Send + Sync + 'static;
    type CsvExportService: CsvExportService + Send + Sync + 'static;
    type FtzApiService: FtzApiService + Send + Sync + 'static;
    type DanlonOauthService: DanlonOauthService + Send + Sync + 'static;
    type DanlonApiService: DanlonApiService + Send + Sync + 'static;
    type MappingService: MappingService + Send + Sync + 'static;
    type SyncService: SyncService + Send + Sync + 'static;

    fn csv_import_service(&self) -> Arc<Self::CsvImportService>;
    fn processing_service(&self) -> Arc<Self::ProcessingService>;
    fn preview_cache_service(&self) -> Arc<Self::PreviewCacheService>;
    fn csv_export_service(&self) -> Arc<Self::CsvExportService>;
    fn ftz_api_service(&self) -> Arc<Self::FtzApiService>;
    fn danlon_oauth_service(&self) -> Arc<Self::DanlonOauthService>;
    fn danlon_api_service(&self) -> Arc<Self::DanlonApiService>;
    fn mapping_service(&self) -> Arc<Self::MappingService>;
    fn sync_service(&self) -> Arc<Self::SyncService>;
}

fn error_response(status: u16, message: String) -> Response {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::new(
            serde_json::json!({ "detail": message }).to_string(),
        ))
        .unwrap()
}

pub(crate) fn error_handler(result: Result<Response, ServiceError>) -> Response {
    match result {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(%error, "request failed");
            match error {
                ServiceError::InvalidInput(message) => error_response(400, message.to_string()),
                ServiceError::SessionNotFound(session_id) => error_response(
                    404,
                    format!("Preview session {session_id} not found. Please upload files again."),
                ),
                ServiceError::NotConnected => error_response(
                    400,
                    "Not connected to Danløn. Please connect first.".to_string(),
                ),
                ServiceError::TokenRefreshFailed(message) => error_response(
                    500,
                    format!("Danløn token refresh failed: {message}. Please reconnect to Danløn."),
                ),
                ServiceError::UpstreamHttpError { status, body } => {
                    error_response(502, format!("Upstream error ({status}): {body}"))
                }
                ServiceError::UpstreamGraphqlError(message) => {
                    error_response(502, format!("Danløn GraphQL error: {message}"))
                }
                ServiceError::DateError(error) => error_response(400, error.to_string()),
                ServiceError::DateComponentError(error) => error_response(400, error.to_string()),
                ServiceError::DatabaseQueryError(error) => error_response(500, error.to_string()),
                ServiceError::InternalError => {
                    error_response(500, "Internal server error".to_string())
                }
            }
        }
    }
}

pub(crate) fn json_response<T: serde::Serialize>(value: &T) -> Response {
    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(Body::new(serde_json::to_string(value).unwrap()))
        .unwrap()
}

pub(crate) fn redirect_response(location: &str) -> Response {
    Response::builder()
        .status(302)
        .header("Location", location)
        .body(Body::empty())
        .unwrap()
}

async fn openapi_document() -> Response {
    let mut document = preview::PreviewApiDoc::openapi();
    document.merge(ftz::FtzApiDoc::openapi());
    document.merge(danlon::DanlonApiDoc::openapi());
    json_response(&document)
}

pub async fn start_server<RestState: RestStateDef>(rest_state: RestState) {
    let app = Router::new()
        .nest(
            "/api",
            preview::generate_route::<RestState>().merge(ftz::generate_route::<RestState>()),
        )
        .nest("/danlon", danlon::generate_route::<RestState>())
        .route("/api-docs/openapi.json", get(openapi_document))
        .with_state(rest_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000")
        .await
        .expect("Could not bind server");
    tracing::info!("listening on {}", listener.local_addr().expect("local addr"));
    axum::serve(listener, app)
        .await
        .expect("Could not start server");
}
