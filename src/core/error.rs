use thiserror::Error;
use crate::services::ports::RepositoryError;

/// Errors returned by a match run
#[derive(Debug, Error)]
pub enum MatchError {
    /// The request was rejected before any collaborator was called
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced client or property does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator failed; no retry is attempted here
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The blocking scoring task panicked or was cancelled
    #[error("Scoring task failed: {0}")]
    Scoring(#[from] tokio::task::JoinError),
}

impl From<validator::ValidationErrors> for MatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MatchError::Validation(errors.to_string())
    }
}
