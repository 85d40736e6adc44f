use crate::api::errors::ApiError;
use crate::core::TaskManager;
use axum::extract::{Extension, Path};
use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Serves a stored chart image; public, like any static asset
pub async fn serve_upload(
    Extension(manager): Extension<TaskManager>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    let (bytes, content_type) = manager.read_upload(&file_name).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
