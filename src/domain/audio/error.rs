use super::model::InvalidTransition;
use crate::error::AppError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AudioServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("chapter {0} has no text to synthesize")]
    EmptyContent(Uuid),
    #[error("audio generation failed for job {job_id}: {message}")]
    GenerationFailed { job_id: Uuid, message: String },
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AudioServiceError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AudioServiceError::InvalidInput(_) => "invalid_input",
            AudioServiceError::NotFound(_) => "not_found",
            AudioServiceError::EmptyContent(_) => "empty_content",
            AudioServiceError::GenerationFailed { .. } => "generation_failed",
            AudioServiceError::Persistence(_) => "persistence",
            AudioServiceError::Transition(_) | AudioServiceError::Other(_) => "internal",
        }
    }
}

/// Store and repository failures. A missing row here is an inconsistency in
/// storage, not a missing resource the caller asked for.
impl From<AppError> for AudioServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => AudioServiceError::InvalidInput(msg),
            _ => AudioServiceError::Persistence(err.to_string()),
        }
    }
}

impl From<AudioServiceError> for AppError {
    fn from(err: AudioServiceError) -> Self {
        match err {
            AudioServiceError::InvalidInput(msg) => AppError::BadRequest(msg),
            AudioServiceError::NotFound(what) => AppError::NotFound(what),
            AudioServiceError::EmptyContent(_) => AppError::UnprocessableEntity(err.to_string()),
            AudioServiceError::GenerationFailed { .. } => AppError::ExternalService(err.to_string()),
            AudioServiceError::Persistence(msg) => AppError::Internal(msg),
            AudioServiceError::Transition(e) => AppError::Internal(e.to_string()),
            AudioServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
