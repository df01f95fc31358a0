// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for the spot engine and its HTTP boundary

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Application-specific error types
/// DOCUMENTATION: Validation and quota errors are produced before any remote call;
/// remote and collaborator errors are caught at the action boundary.
#[derive(Error, Debug)]
pub enum SpotsError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No active session")]
    Unauthorized,

    #[error("{resource} limit reached: the current plan allows {limit}")]
    QuotaExceeded { resource: &'static str, limit: u32 },

    #[error("Could not retrieve info: {0}")]
    CollaboratorUnavailable(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Network unavailable: {0}")]
    Offline(String),
}

impl SpotsError {
    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            SpotsError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            SpotsError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            SpotsError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            SpotsError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            SpotsError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            SpotsError::QuotaExceeded { .. } => (StatusCode::FORBIDDEN, "QUOTA_EXCEEDED"),
            SpotsError::CollaboratorUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, "COLLABORATOR_UNAVAILABLE")
            }
            SpotsError::StorageError(_) => (StatusCode::BAD_GATEWAY, "STORAGE_ERROR"),
            SpotsError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            SpotsError::Offline(_) => (StatusCode::SERVICE_UNAVAILABLE, "OFFLINE"),
        }
    }

    /// Build a single-field validation error
    pub fn field(field: &'static str, code: &'static str, message: &str) -> Self {
        let mut err = validator::ValidationError::new(code);
        err.message = Some(message.to_string().into());
        let mut errors = ValidationErrors::new();
        errors.add(field, err);
        SpotsError::Validation(errors)
    }
}

impl From<sqlx::Error> for SpotsError {
    fn from(e: sqlx::Error) -> Self {
        SpotsError::DatabaseError(e.to_string())
    }
}

impl From<ValidationErrors> for SpotsError {
    fn from(e: ValidationErrors) -> Self {
        SpotsError::Validation(e)
    }
}

/// Convert SpotsError to HTTP response
/// DOCUMENTATION: Validation errors carry the per-field map so the UI can
/// render each message next to the offending field.
impl ResponseError for SpotsError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.code();

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });
        if let SpotsError::Validation(errors) = self {
            body["error"]["fields"] = json!(errors.field_errors());
        }

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.code().0
    }
}
