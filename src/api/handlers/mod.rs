mod groups;
mod tasks;
mod templates;
mod uploads;

use axum::Json;
use serde::Serialize;

pub use groups::*;
pub use tasks::*;
pub use templates::*;
pub use uploads::*;

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Liveness probe
pub async fn health() -> Json<MessageResponse> {
    MessageResponse::new("Chart accessibility service is running")
}

/// Treats empty form and query values as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
