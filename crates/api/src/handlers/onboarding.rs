//! Handlers for resumable onboarding wizard sessions.
//!
//! Sessions are addressed by their resume token; the token is the only
//! credential the wizard holds.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use newsdesk_db::models::onboarding_session::SaveOnboardingSession;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// PUT /onboarding
// ---------------------------------------------------------------------------

/// Save the wizard state. Without a `resumeToken` a new session is started
/// and its token returned.
pub async fn save_session(
    State(state): State<AppState>,
    Json(body): Json<SaveOnboardingSession>,
) -> AppResult<impl IntoResponse> {
    let session = state.services.onboarding.save(body).await?;
    Ok(Json(DataResponse { data: session }))
}

// ---------------------------------------------------------------------------
// GET /onboarding/{token}
// ---------------------------------------------------------------------------

pub async fn load_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = state.services.onboarding.load(&token).await?;
    Ok(Json(DataResponse { data: session }))
}

// ---------------------------------------------------------------------------
// DELETE /onboarding/{token}
// ---------------------------------------------------------------------------

/// Best-effort delete; always answers 204.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> StatusCode {
    state.services.onboarding.delete(&token).await;
    StatusCode::NO_CONTENT
}

// ---------------------------------------------------------------------------
// POST /onboarding/{token}/provision
// ---------------------------------------------------------------------------

/// Create the tenant described by a finished wizard session.
pub async fn provision(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let tenant = state
        .services
        .lifecycle
        .provision_from_session(&token)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: tenant })))
}
