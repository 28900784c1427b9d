// Routes module - Centralizes all route definitions
pub mod media;
pub mod public;
pub mod tasks;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use crate::app::AppState;
use std::sync::Arc;

/// Build the main application router
pub fn create_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(public::create_public_routes())
        .merge(media::create_media_routes())
        .merge(tasks::create_task_routes())
        // Inline uploads arrive base64-encoded, so the default 2MB cap is too small
        .layer(DefaultBodyLimit::max(state.settings.max_body_bytes()))
}
