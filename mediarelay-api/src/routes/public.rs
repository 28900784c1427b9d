// Public informational routes
use crate::app::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_docs;
use crate::version;

/// Create public routes router
pub fn create_public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api_docs::ApiDoc::openapi()),
        )
        .route("/", get(root))
        .route("/version", get(get_version))
}

/// Get version information (public endpoint)
async fn get_version(State(state): State<Arc<AppState>>) -> axum::Json<version::VersionInfo> {
    axum::Json(version::get_version_info(state.rehoster.host_name()))
}

async fn root() -> &'static str {
    "MediaRelay API - image rehosting and generation task submission"
}
