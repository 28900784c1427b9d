use axum::routing::post;
use axum::Router;
use crate::app::AppState;
use std::sync::Arc;

use crate::handlers::tasks::create_task;

/// Create task submission router
pub fn create_task_routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks", post(create_task))
}
