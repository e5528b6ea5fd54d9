// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy. Every failure is terminal for the request:
/// there are no retries, and transactional writes roll back on the first
/// error they hit.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input or a broken business rule. Always a 400 with a
    /// human-readable message.
    #[error("{0}")]
    Validation(String),

    /// Field-level validation failures from the `validator` derives.
    #[error("One or more fields are invalid")]
    FieldValidation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    /// Unique-constraint conflicts (bill numbers, payment numbers,
    /// customer names).
    #[error("{0}")]
    Conflict(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::FieldValidation(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "One or more fields are invalid", "details": details }),
                )
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                json!({ "error": message, "code": "unique_violation" }),
            ),
            // Storage failures and anything unexpected become an opaque
            // 500; the detailed message only goes to the log.
            ref e => {
                tracing::error!("internal server error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
