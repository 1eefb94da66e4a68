//! Handlers for the per-tenant credit ledger.
//!
//! A spend request names either an explicit `cost` or a metered AI
//! `operation`, which is priced from the current AI settings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use newsdesk_core::types::TenantId;
use newsdesk_db::models::credit::AllocateCycle;
use newsdesk_db::models::settings::AiOperation;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::TenantKey;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_TRANSACTION_LIMIT: usize = 50;
const MAX_TRANSACTION_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Request bodies / query parameters
// ---------------------------------------------------------------------------

/// Body of `authorize` and `charge`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendRequest {
    pub operation: Option<AiOperation>,
    pub cost: Option<u64>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the credit cost of a spend request. An explicit `cost` wins over
/// the operation's configured price.
async fn resolve_cost(state: &AppState, body: &SpendRequest) -> AppResult<u64> {
    match (body.cost, body.operation) {
        (Some(cost), _) => Ok(cost),
        (None, Some(operation)) => Ok(state.services.settings.cost_of(operation).await?),
        (None, None) => Err(AppError::BadRequest(
            "Either 'cost' or 'operation' is required".into(),
        )),
    }
}

fn describe(body: &SpendRequest) -> String {
    body.description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| body.operation.map(|op| op.as_str().to_string()))
        .unwrap_or_else(|| "credit charge".to_string())
}

// ---------------------------------------------------------------------------
// POST /tenants/{id}/credits/cycles
// ---------------------------------------------------------------------------

pub async fn allocate_cycle(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<AllocateCycle>,
) -> AppResult<impl IntoResponse> {
    let entry = state.services.ledger.allocate_cycle(id, body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

// ---------------------------------------------------------------------------
// GET /tenants/{id}/credits
// ---------------------------------------------------------------------------

/// The ledger entry for the cycle covering now; `data` is null when the
/// tenant has none.
pub async fn current_entry(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let entry = state.services.ledger.current_entry(id).await?;
    Ok(Json(DataResponse { data: entry }))
}

// ---------------------------------------------------------------------------
// POST /tenants/{id}/credits/authorize
// ---------------------------------------------------------------------------

pub async fn authorize(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Json(body): Json<SpendRequest>,
) -> AppResult<impl IntoResponse> {
    let cost = resolve_cost(&state, &body).await?;
    let decision = state.services.ledger.authorize(id, cost).await?;
    Ok(Json(DataResponse { data: decision }))
}

// ---------------------------------------------------------------------------
// POST /tenants/{id}/credits/charge
// ---------------------------------------------------------------------------

/// Authorize and debit in one step. Called by the tenant's site with its
/// API key.
pub async fn charge(
    State(state): State<AppState>,
    tenant: TenantKey,
    Json(body): Json<SpendRequest>,
) -> AppResult<impl IntoResponse> {
    let cost = resolve_cost(&state, &body).await?;
    let receipt = state
        .services
        .ledger
        .charge(tenant.tenant_id, cost, &describe(&body))
        .await?;
    Ok(Json(DataResponse { data: receipt }))
}

// ---------------------------------------------------------------------------
// GET /tenants/{id}/credits/transactions
// ---------------------------------------------------------------------------

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
    Query(params): Query<TransactionListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
        .clamp(1, MAX_TRANSACTION_LIMIT);
    let transactions = state.services.ledger.transactions(id, limit).await?;
    Ok(Json(DataResponse { data: transactions }))
}

// ---------------------------------------------------------------------------
// GET /tenants/{id}/credits/reconcile
// ---------------------------------------------------------------------------

pub async fn reconcile(
    State(state): State<AppState>,
    Path(id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let reconciliation = state.services.ledger.reconcile(id).await?;
    if !reconciliation.balanced {
        tracing::warn!(
            tenant_id = %id,
            credits_used = reconciliation.credits_used,
            debited_total = reconciliation.debited_total,
            "Credit ledger does not match its transactions"
        );
    }
    Ok(Json(DataResponse { data: reconciliation }))
}
