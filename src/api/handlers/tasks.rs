use super::{non_empty, MessageResponse};
use crate::api::errors::{api_error, ApiError};
use crate::api::identity::CurrentUser;
use crate::core::{
    MetadataRequest, Page, Task, TaskDetails, TaskFilter, TaskManager, TaskStatus, UpdateTask,
    UploadRequest,
};
use crate::errors::Error;
use crate::templates::RenderedTemplate;
use crate::utils::parse_timestamp;
use axum::extract::{Extension, Multipart, Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

/// Query string accepted by the task listing
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub keyword: Option<String>,
    pub task_name: Option<String>,
    /// Numeric code or name
    pub status: Option<String>,
    pub group_id: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub updated_from: Option<String>,
    pub updated_to: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListTasksQuery {
    fn to_filter(&self) -> Result<TaskFilter, Error> {
        let instant = |value: &Option<String>| {
            non_empty(value.clone())
                .map(|v| parse_timestamp(&v))
                .transpose()
        };

        Ok(TaskFilter {
            keyword: non_empty(self.keyword.clone()),
            task_name: non_empty(self.task_name.clone()),
            status: non_empty(self.status.clone())
                .map(|s| s.parse::<TaskStatus>())
                .transpose()?,
            group_id: non_empty(self.group_id.clone()),
            created_from: instant(&self.created_from)?,
            created_to: instant(&self.created_to)?,
            updated_from: instant(&self.updated_from)?,
            updated_to: instant(&self.updated_to)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderQuery {
    pub template_id: Option<String>,
}

/// Lists the caller's tasks with their results
pub async fn list_tasks(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Page<TaskDetails>>, ApiError> {
    let filter = query.to_filter()?;
    let page = manager.list_tasks(&user_id, &filter, query.page, query.per_page)?;
    Ok(Json(page))
}

/// Accepts a multipart chart upload and queues it for processing
///
/// Fields: `file` (required), `name` or `title`, `template_id`, `group_id`.
pub async fn create_task(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let mut request = UploadRequest::default();
    let mut has_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                has_file = true;
                request.file_name = field.file_name().unwrap_or_default().to_string();
                request.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.body_text()))?
                    .to_vec();
            }
            "name" | "title" | "template_id" | "group_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.body_text()))?;
                match field_name.as_str() {
                    "template_id" => request.template_id = non_empty(Some(value)),
                    "group_id" => request.group_id = non_empty(Some(value)),
                    _ if request.name.trim().is_empty() => request.name = value,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    if !has_file {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Please upload a chart image or use the metadata endpoint",
        ));
    }

    let task = manager.create_upload_task(&user_id, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Creates a completed task from supplied metadata
pub async fn create_metadata_task(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<MetadataRequest>,
) -> Result<(StatusCode, Json<TaskDetails>), ApiError> {
    let details = manager.create_metadata_task(&user_id, request)?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn get_task(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Json<TaskDetails>, ApiError> {
    Ok(Json(manager.get_task(&user_id, &task_id)?))
}

pub async fn update_task(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(task_id): Path<String>,
    Json(update): Json<UpdateTask>,
) -> Result<Json<TaskDetails>, ApiError> {
    Ok(Json(manager.update_task(&user_id, &task_id, update.into())?))
}

pub async fn delete_task(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    manager.delete_task(&user_id, &task_id)?;
    Ok(MessageResponse::new("Task deleted"))
}

pub async fn cancel_task(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(manager.cancel_task(&user_id, &task_id)?))
}

pub async fn render_task_template(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(task_id): Path<String>,
    Query(query): Query<RenderQuery>,
) -> Result<Json<RenderedTemplate>, ApiError> {
    let template_id = non_empty(query.template_id)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing template_id"))?;
    Ok(Json(manager.render_template(
        &user_id,
        &task_id,
        &template_id,
    )?))
}

/// Streams the zip bundle of a completed task
pub async fn download_task_bundle(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let (file_name, bytes) = manager.download_bundle(&user_id, &task_id)?;
    let disposition = format!("attachment; filename=\"{}\"", file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
