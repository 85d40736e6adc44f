//! API routes configuration module

use crate::api::handlers::{
    cancel_task, create_group, create_metadata_task, create_task, create_template, delete_group,
    delete_task, delete_template, download_task_bundle, get_task, health, list_groups, list_tasks,
    list_templates, render_task_template, serve_upload, update_group, update_task,
    update_template, validate_template,
};
use crate::core::TaskManager;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Extension, Router,
};

/// Largest accepted request body, sized for chart images
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Creates and configures the API router with all routes
///
/// # Arguments
/// * `manager` - Task manager shared across handlers
///
/// # Returns
/// * `Router` - Configured router with all API endpoints and middleware
pub fn app(manager: TaskManager) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/uploads/:filename", get(serve_upload))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/metadata", post(create_metadata_task))
        .route(
            "/tasks/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/tasks/:id/cancel", post(cancel_task))
        .route("/tasks/:id/render-template", get(render_task_template))
        .route("/tasks/:id/download", get(download_task_bundle))
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/validate", post(validate_template))
        .route(
            "/templates/:id",
            patch(update_template).delete(delete_template),
        )
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/:id", patch(update_group).delete(delete_group))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(manager))
}
