//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists (unique constraint)
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },
}

impl DatabaseError {
    /// Convert a unique-constraint violation into [`DatabaseError::AlreadyExists`].
    pub(crate) fn unique_violation(entity: &'static str, id: impl Into<String>) -> impl FnOnce(sqlx::Error) -> Self {
        let id = id.into();
        move |e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists { entity, id };
                }
            }
            DatabaseError::Sqlx(e)
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Whether this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
