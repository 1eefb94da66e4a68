//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use uuid::Uuid;

use newsdesk_api::error::AppError;
use newsdesk_core::error::CoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::not_found("Tenant", "abc"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Tenant with id abc not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("slug too short".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "slug too short");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("missing cost".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "missing cost");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("Slug 'pine' is already in use".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn insufficient_credits_returns_402_with_amounts() {
    let err = AppError::Core(CoreError::InsufficientCredits {
        tenant_id: Uuid::nil(),
        requested: 50,
        available: Some(20),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["code"], "INSUFFICIENT_CREDITS");
    assert_eq!(json["requested"], 50);
    assert_eq!(json["available"], 20);
}

#[tokio::test]
async fn insufficient_credits_without_cycle_reports_null_available() {
    let err = AppError::Core(CoreError::InsufficientCredits {
        tenant_id: Uuid::nil(),
        requested: 5,
        available: None,
    });

    let (_, json) = error_to_response(err).await;

    assert!(json["available"].is_null());
}

#[tokio::test]
async fn collaborator_failure_returns_502_and_is_retryable() {
    let err = AppError::Core(CoreError::Collaborator {
        collaborator: "vercel",
        reason: "timeout".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "COLLABORATOR_FAILURE");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn partial_cascade_reports_progress_and_is_retryable() {
    let err = AppError::Core(CoreError::PartialCascade {
        tenant_id: Uuid::nil(),
        completed: vec!["articles".into(), "categories".into()],
        failed_step: "aiJournalists".into(),
        reason: "store unavailable".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "PARTIAL_CASCADE");
    assert_eq!(json["failedStep"], "aiJournalists");
    assert_eq!(json["completed"][1], "categories");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("Invalid API key".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("connection string leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}
