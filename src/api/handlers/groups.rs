use super::MessageResponse;
use crate::api::errors::ApiError;
use crate::api::identity::CurrentUser;
use crate::core::{CreateGroup, Group, GroupNode, TaskManager, UpdateGroup};
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;

/// The caller's group tree
pub async fn list_groups(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<GroupNode>>, ApiError> {
    Ok(Json(manager.list_groups(&user_id)?))
}

pub async fn create_group(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<CreateGroup>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = manager.create_group(&user_id, request)?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_group(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(group_id): Path<String>,
    Json(request): Json<UpdateGroup>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(manager.update_group(&user_id, &group_id, request)?))
}

pub async fn delete_group(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(group_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    manager.delete_group(&user_id, &group_id)?;
    Ok(MessageResponse::new("Group deleted"))
}
