//! Handlers for tenant lifecycle management: creation, seeding, activation,
//! licensing, custom domains and cascading deletion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use newsdesk_core::types::TenantId;
use newsdesk_db::models::tenant::{CreateTenant, RecordDeployment, UpdateLicensing};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DomainRequestBody {
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectDomainBody {
    pub reason: String,
}

// ---------------------------------------------------------------------------
// GET /slugs/{slug}/availability
// ---------------------------------------------------------------------------

/// Report whether `slug` can be claimed, and why not if it can't.
pub async fn check_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let availability = state.services.lifecycle.check_slug(&slug).await?;
    Ok(Json(DataResponse { data: availability }))
}

// ---------------------------------------------------------------------------
// POST /tenants
// ---------------------------------------------------------------------------

/// The response carries the tenant's API key; it is never shown again.
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(body): Json<CreateTenant>,
) -> AppResult<impl IntoResponse> {
    let created = state.services.lifecycle.create_tenant(body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// GET /tenants/{id}
// ---------------------------------------------------------------------------

pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let tenant = state.services.lifecycle.get_tenant(id).await?;
    Ok(Json(DataResponse { data: tenant }))
}

// ---------------------------------------------------------------------------
// DELETE /tenants/{id}
// ---------------------------------------------------------------------------

/// Cascade-delete a tenant. Safe to repeat; a partial failure is reported
/// as retryable.
pub async fn delete_tenant(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let report = state.services.lifecycle.delete_tenant(id).await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /tenants/{id}/api-key
pub async fn rotate_api_key(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let rotated = state.services.lifecycle.rotate_api_key(id).await?;
    Ok(Json(DataResponse { data: rotated }))
}

/// PUT /tenants/{id}/deployment
pub async fn record_deployment(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<RecordDeployment>,
) -> AppResult<impl IntoResponse> {
    let tenant = state.services.lifecycle.record_deployment(id, body).await?;
    Ok(Json(DataResponse { data: tenant }))
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// POST /tenants/{id}/seed
pub async fn begin_seeding(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let tenant = state.services.lifecycle.begin_seeding(id).await?;
    Ok(Json(DataResponse { data: tenant }))
}

/// POST /tenants/{id}/activate
pub async fn activate(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let tenant = state.services.lifecycle.activate(id).await?;
    Ok(Json(DataResponse { data: tenant }))
}

/// PUT /tenants/{id}/licensing
pub async fn update_licensing(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<UpdateLicensing>,
) -> AppResult<impl IntoResponse> {
    let tenant = state
        .services
        .lifecycle
        .apply_licensing_status(id, body)
        .await?;
    Ok(Json(DataResponse { data: tenant }))
}

// ---------------------------------------------------------------------------
// Custom domains
// ---------------------------------------------------------------------------

/// POST /tenants/{id}/domain-request
pub async fn request_domain(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<DomainRequestBody>,
) -> AppResult<impl IntoResponse> {
    let tenant = state
        .services
        .lifecycle
        .request_domain(id, &body.domain)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: tenant })))
}

/// POST /tenants/{id}/domain-request/approve
///
/// Registers the domain with the hosting provider first; a registrar
/// failure leaves the request pending.
pub async fn approve_domain(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let tenant = state.services.lifecycle.approve_domain(id).await?;
    Ok(Json(DataResponse { data: tenant }))
}

/// POST /tenants/{id}/domain-request/reject
pub async fn reject_domain(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<RejectDomainBody>,
) -> AppResult<impl IntoResponse> {
    let tenant = state
        .services
        .lifecycle
        .reject_domain(id, &body.reason)
        .await?;
    Ok(Json(DataResponse { data: tenant }))
}
