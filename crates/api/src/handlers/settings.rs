//! Handlers for platform-wide AI settings.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use newsdesk_db::models::settings::AiSettings;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /settings/ai
pub async fn get_ai_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let settings = state.services.settings.get().await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /settings/ai
pub async fn update_ai_settings(
    State(state): State<AppState>,
    Json(body): Json<AiSettings>,
) -> AppResult<impl IntoResponse> {
    let settings = state.services.settings.update(body).await?;
    Ok(Json(DataResponse { data: settings }))
}
