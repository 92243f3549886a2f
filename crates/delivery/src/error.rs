use thiserror::Error;

/// Errors that stop a dispatcher run or sender setup.
///
/// Failures of individual sends are not errors; they are reported as a
/// [`SendOutcome`](crate::SendOutcome) and recorded on the queue entry.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Failed to build a transport or HTTP client.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing required environment variable.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Result type for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;
