use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stacktutor_core::error::{self, ApiError};

use crate::ai::AiError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Missing, malformed, or expired credentials (401)
    Unauthorized {
        message: String,
        docs_hint: Option<String>,
    },
    /// Resource absent (404)
    NotFound { resource: String },
    /// Duplicate email or duplicate term (400)
    Conflict {
        message: String,
        field: Option<String>,
        docs_hint: Option<String>,
    },
    /// AI collaborator failed or returned garbage (500)
    Upstream(AiError),
    /// Database error (500)
    Database(sqlx::Error),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::Unauthorized { message, docs_hint } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: error::codes::UNAUTHORIZED.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} was not found"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Conflict {
                message,
                field,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::CONFLICT.to_string(),
                    message,
                    field,
                    received: None,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::Upstream(err) => {
                tracing::error!("AI collaborator failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::UPSTREAM_ERROR.to_string(),
                        message: "The grading service failed to produce a usable response"
                            .to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: Some("Retry the request in a moment.".to_string()),
                    },
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        AppError::Upstream(err)
    }
}

/// Postgres unique-violation code. Conflicting concurrent writes surface
/// through this rather than through read-then-write checks.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Map a unique-constraint violation to the given conflict, passing other
/// database errors through.
pub fn on_unique_violation(err: sqlx::Error, conflict: AppError) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return conflict;
        }
    }
    AppError::Database(err)
}
