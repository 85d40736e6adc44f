use crate::analysis::AnalysisError;
use diesel::r2d2::PoolError;
use diesel::result::Error as DieselError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Template is missing required placeholders: {}", .0.join(", "))]
    MissingPlaceholders(Vec<String>),
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },
    #[error("Task result is not ready yet")]
    NotReady,
    #[error("Task generation failed: {0}")]
    GenerationFailed(String),
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Diesel error: {0}")]
    DieselError(#[from] DieselError),
    #[error("Connection pool error: {0}")]
    PoolError(#[from] PoolError),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            resource,
            id: id.into(),
        }
    }
}
