// Media routes: inline uploads, URL rehosting and signed direct uploads
use axum::routing::post;
use axum::Router;
use crate::app::AppState;
use std::sync::Arc;

use crate::handlers::media::{rehost_urls, sign_upload, upload_files};

/// Create media routes router
pub fn create_media_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_files))
        .route("/rehost", post(rehost_urls))
        .route("/sign-upload", post(sign_upload))
}
