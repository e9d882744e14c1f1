// src/quiz/error.rs

use thiserror::Error;

use crate::store::StoreError;

/// Failures of the quiz core. Nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Malformed identifiers or out-of-range quiz state.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    /// The session belongs to a different principal.
    #[error("Unauthorized quiz session access.")]
    Unauthorized,

    /// The chosen index failed answer validation.
    #[error("Selected option is invalid.")]
    InvalidSelection,

    /// A duplicate insert lost the race and the winning answer could not be read back.
    #[error("Answer was recorded concurrently.")]
    Conflict,

    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
}

impl From<StoreError> for QuizError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => QuizError::Conflict,
            other => QuizError::UpstreamFailure(other.to_string()),
        }
    }
}
