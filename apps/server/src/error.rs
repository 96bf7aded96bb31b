//! Domain error types for the UI Automation Server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
///
/// In-step failures (resolution, capability, action-runtime) are normally
/// caught by the step runner and folded into a fail `StepResult`; they only
/// reach the HTTP boundary when raised outside of step execution.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request failed validation before any work started
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Referenced resource does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Browser driver could not be initialized or launched
    #[error("Browser driver error: {0}")]
    Driver(String),

    /// A browser operation failed mid-flight
    #[error("Browser operation failed: {0}")]
    Browser(String),

    /// An element or frame could not be resolved within its deadline
    #[error("{0}")]
    Resolution(String),

    /// The action or assertion kind is not supported
    #[error("{0}")]
    Capability(String),

    /// An action started but could not complete
    #[error("{0}")]
    ActionRuntime(String),
}

impl AppError {
    /// Wrap an arbitrary driver-layer error into a `Browser` error.
    pub fn browser<E: fmt::Debug>(err: E) -> Self {
        AppError::Browser(format!("{err:?}"))
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code, response_message) = match self {
            AppError::Validation(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                self.to_string(),
            ),
            AppError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Driver(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "DRIVER_ERROR",
                self.to_string(),
            ),
            AppError::Browser(_)
            | AppError::Resolution(_)
            | AppError::Capability(_)
            | AppError::ActionRuntime(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "EXECUTION_ERROR",
                self.to_string(),
            ),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching the OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("Invalid UUID: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = AppError::Validation("missing testCaseId".into());
        assert_eq!(err.error_response().status(), 400);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("Test case".into());
        assert_eq!(err.error_response().status(), 404);
        assert_eq!(err.to_string(), "Test case not found");
    }

    #[test]
    fn driver_maps_to_500() {
        let err = AppError::Driver("launch failed".into());
        assert_eq!(err.error_response().status(), 500);
    }
}
