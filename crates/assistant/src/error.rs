//! Error types for assistant operations.

use thiserror::Error;

/// Errors that can occur while talking to the assistant.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The assistant backend could not be reached or refused the request.
    #[error("assistant unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time.
    #[error("assistant timed out")]
    Timeout,

    /// The backend answered with something unusable.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The user's message was rejected before sending.
    #[error("invalid message: {0}")]
    Validation(#[from] database::ValidationError),

    /// Chat history could not be read or written.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),
}

impl AssistantError {
    /// Whether the failure lies with the backend rather than the caller or
    /// the local store.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            AssistantError::Unavailable(_)
                | AssistantError::Timeout
                | AssistantError::ProcessingFailed(_)
                | AssistantError::Configuration(_)
        )
    }
}

/// Result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
