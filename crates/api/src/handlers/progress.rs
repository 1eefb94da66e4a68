//! Handlers for setup progress polling and updates.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use newsdesk_core::setup_progress::SetupStep;
use newsdesk_core::types::TenantId;
use newsdesk_db::models::setup_progress::SetupProgressView;

use crate::error::AppResult;
use crate::middleware::auth::TenantKey;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub step: SetupStep,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleGeneratedRequest {
    pub category_slug: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordErrorRequest {
    pub message: String,
}

/// GET /tenants/{id}/progress
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let progress = state.services.progress.get(id).await?;
    Ok(Json(DataResponse {
        data: SetupProgressView::from(progress),
    }))
}

/// POST /tenants/{id}/progress/advance
///
/// Stale steps are accepted and ignored; the response shows where setup
/// actually is.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<AdvanceRequest>,
) -> AppResult<impl IntoResponse> {
    let progress = state.services.progress.advance(id, body.step).await?;
    Ok(Json(DataResponse {
        data: SetupProgressView::from(progress),
    }))
}

/// POST /tenants/{id}/progress/articles
pub async fn record_article(
    State(state): State<AppState>,
    tenant: TenantKey,
    Json(body): Json<ArticleGeneratedRequest>,
) -> AppResult<impl IntoResponse> {
    let progress = state
        .services
        .progress
        .record_article_generated(tenant.tenant_id, &body.category_slug)
        .await?;
    Ok(Json(DataResponse {
        data: SetupProgressView::from(progress),
    }))
}

/// POST /tenants/{id}/progress/errors
pub async fn record_error(
    State(state): State<AppState>,
    tenant: TenantKey,
    Json(body): Json<RecordErrorRequest>,
) -> AppResult<impl IntoResponse> {
    let progress = state
        .services
        .progress
        .record_error(tenant.tenant_id, &body.message)
        .await?;
    Ok(Json(DataResponse {
        data: SetupProgressView::from(progress),
    }))
}
