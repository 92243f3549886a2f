//! Error types for sharing operations.

use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors that can occur in the sharing core.
#[derive(Debug, Error)]
pub enum SharingError {
    /// Input failed validation.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A user asked to read their own metrics.
    #[error("cannot request access to your own readings")]
    InvalidSelfRequest,

    /// A pending request already exists for the pair.
    #[error("a pending request already exists for this user")]
    DuplicateRequest,

    /// The request is no longer pending.
    #[error("request has already been resolved")]
    AlreadyResolved,

    /// The requester already holds a permission from the owner.
    #[error("access has already been granted")]
    AlreadyGranted,

    /// The caller may not read the owner's metrics.
    #[error("not permitted to read these readings")]
    Forbidden,

    /// Record not found, or not visible to the caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Storage failure.
    #[error("database error: {0}")]
    Database(DatabaseError),
}

/// Coarse error classes, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authorization,
    NotFound,
    Internal,
}

impl SharingError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SharingError::Validation(_) | SharingError::InvalidSelfRequest => ErrorKind::Validation,
            SharingError::DuplicateRequest | SharingError::AlreadyResolved | SharingError::AlreadyGranted => {
                ErrorKind::Conflict
            }
            SharingError::Forbidden => ErrorKind::Authorization,
            SharingError::NotFound { .. } => ErrorKind::NotFound,
            SharingError::Database(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        SharingError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<DatabaseError> for SharingError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, id } => SharingError::NotFound { entity, id },
            other => SharingError::Database(other),
        }
    }
}

impl From<sqlx::Error> for SharingError {
    fn from(err: sqlx::Error) -> Self {
        SharingError::Database(DatabaseError::Sqlx(err))
    }
}

/// Result type for sharing operations.
pub type Result<T> = std::result::Result<T, SharingError>;
