//! Error types for the HTTP API.

use assistant::AssistantError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sharing::{ErrorKind, SharingError};
use thiserror::Error;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No caller identity on the request.
    #[error("missing user identity")]
    Unauthorized,

    /// Sharing core error.
    #[error(transparent)]
    Sharing(#[from] SharingError),

    /// Assistant error.
    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Sharing(err) => match err.kind() {
                ErrorKind::Validation => (StatusCode::BAD_REQUEST, err.to_string()),
                ErrorKind::Conflict => (StatusCode::CONFLICT, err.to_string()),
                ErrorKind::Authorization => (StatusCode::FORBIDDEN, err.to_string()),
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                ErrorKind::Internal => {
                    tracing::error!("Database error: {}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
            },
            ApiError::Assistant(err) => match err {
                AssistantError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                AssistantError::Database(e) => {
                    tracing::error!("Database error: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
                }
                _ => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "assistant is unavailable, please try again later".to_string(),
                ),
            },
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::Sharing(SharingError::InvalidSelfRequest), StatusCode::BAD_REQUEST),
            (ApiError::Sharing(SharingError::DuplicateRequest), StatusCode::CONFLICT),
            (ApiError::Sharing(SharingError::AlreadyGranted), StatusCode::CONFLICT),
            (ApiError::Sharing(SharingError::Forbidden), StatusCode::FORBIDDEN),
            (
                ApiError::Sharing(SharingError::NotFound {
                    entity: "HealthMetric",
                    id: "m1".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::Assistant(AssistantError::Timeout), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
