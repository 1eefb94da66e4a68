use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use newsdesk_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `newsdesk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => classify_core_error(core),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let (Some(Value::Object(extra)), Value::Object(map)) = (details, &mut body) {
            map.extend(extra);
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error onto an HTTP status, error code, message and any
/// extra fields the client needs to react (e.g. the available balance).
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String, Option<Value>) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
            None,
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
        CoreError::InsufficientCredits {
            requested,
            available,
            ..
        } => (
            StatusCode::PAYMENT_REQUIRED,
            "INSUFFICIENT_CREDITS",
            err.to_string(),
            Some(json!({
                "requested": requested,
                "available": available,
            })),
        ),
        CoreError::Collaborator {
            collaborator,
            reason,
        } => {
            tracing::warn!(collaborator, reason = %reason, "Collaborator failure");
            (
                StatusCode::BAD_GATEWAY,
                "COLLABORATOR_FAILURE",
                err.to_string(),
                Some(json!({ "retryable": true })),
            )
        }
        CoreError::PartialCascade {
            completed,
            failed_step,
            reason,
            ..
        } => {
            tracing::error!(failed_step = %failed_step, reason = %reason, "Cascade delete incomplete");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PARTIAL_CASCADE",
                format!("Tenant deletion stopped at '{failed_step}'; retry to finish"),
                Some(json!({
                    "completed": completed,
                    "failedStep": failed_step,
                    "retryable": true,
                })),
            )
        }
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            )
        }
    }
}
