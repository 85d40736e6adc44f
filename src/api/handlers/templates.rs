use super::MessageResponse;
use crate::api::errors::ApiError;
use crate::api::identity::CurrentUser;
use crate::constants::REQUIRED_PLACEHOLDERS;
use crate::core::{CreateTemplate, TaskManager, UpdateTemplate};
use crate::templates::{self, CodeTemplate};
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ValidateTemplateRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub missing: Vec<String>,
    pub required: Vec<String>,
}

pub async fn list_templates(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<CodeTemplate>>, ApiError> {
    Ok(Json(manager.list_templates(&user_id)?))
}

pub async fn create_template(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<CreateTemplate>,
) -> Result<(StatusCode, Json<CodeTemplate>), ApiError> {
    let template = manager.create_template(&user_id, request)?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_template(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(template_id): Path<String>,
    Json(request): Json<UpdateTemplate>,
) -> Result<Json<CodeTemplate>, ApiError> {
    Ok(Json(manager.update_template(
        &user_id,
        &template_id,
        request,
    )?))
}

pub async fn delete_template(
    Extension(manager): Extension<TaskManager>,
    CurrentUser(user_id): CurrentUser,
    Path(template_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    manager.delete_template(&user_id, &template_id)?;
    Ok(MessageResponse::new("Template deleted"))
}

/// Reports which required placeholders a draft body lacks
pub async fn validate_template(
    CurrentUser(_): CurrentUser,
    Json(request): Json<ValidateTemplateRequest>,
) -> Json<ValidationReport> {
    Json(ValidationReport {
        missing: templates::validate(&request.content),
        required: REQUIRED_PLACEHOLDERS.iter().map(|p| p.to_string()).collect(),
    })
}
