use crate::errors::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub code: u16,
    /// Required placeholders absent from a submitted template body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiError({}, {})", self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(self);
        (status, body).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => api_error(StatusCode::BAD_REQUEST, &message),
            Error::MissingPlaceholders(missing) => ApiError {
                message: Error::MissingPlaceholders(missing.clone()).to_string(),
                code: StatusCode::BAD_REQUEST.as_u16(),
                missing: Some(missing),
            },
            Error::NotReady | Error::GenerationFailed(_) => {
                api_error(StatusCode::BAD_REQUEST, &err.to_string())
            }
            Error::NotFound { .. } => api_error(StatusCode::NOT_FOUND, &err.to_string()),
            other => {
                error!("Request failed: {}", other);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Helper function to create API errors
pub fn api_error(status: StatusCode, message: &str) -> ApiError {
    ApiError {
        message: message.to_string(),
        code: status.as_u16(),
        missing: None,
    }
}
