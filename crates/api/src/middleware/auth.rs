//! Tenant API key extractor for routes called by a tenant's own site.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use newsdesk_core::error::CoreError;
use newsdesk_core::types::TenantId;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the tenant's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A tenant whose `x-api-key` header matched its stored key.
///
/// Only usable on routes with a single `{id}` path parameter naming the
/// tenant:
///
/// ```ignore
/// async fn charge(tenant: TenantKey, ...) -> AppResult<...> {
///     state.services.ledger.charge(tenant.tenant_id, cost, &body.description).await?;
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TenantKey {
    pub tenant_id: TenantId,
}

impl FromRequestParts<AppState> for TenantKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(tenant_id) = Path::<TenantId>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let api_key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing x-api-key header".into()))
            })?;

        state
            .services
            .lifecycle
            .verify_api_key(tenant_id, api_key)
            .await?;

        Ok(TenantKey { tenant_id })
    }
}
