//! AI journalist document model.

use serde::{Deserialize, Serialize};

use newsdesk_core::types::{TenantId, Timestamp};

/// A document in the top-level `aiJournalists` collection.
///
/// Keyed `{tenantId}_{categorySlug}` so re-seeding a tenant overwrites
/// instead of duplicating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiJournalist {
    pub id: String,
    pub tenant_id: TenantId,
    pub name: String,
    pub category_slug: String,
    /// The category's editorial directive, copied at seeding time.
    pub beat: String,
    pub active: bool,
    pub created_at: Timestamp,
}

impl AiJournalist {
    pub fn document_id(tenant_id: TenantId, category_slug: &str) -> String {
        format!("{tenant_id}_{category_slug}")
    }
}
