//! Tenant document model and DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use newsdesk_core::tenant::{DomainRequestStatus, LicensingStatus, TenantStatus};
use newsdesk_core::types::{TenantId, Timestamp};

/// Where the paper reports from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArea {
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    #[validate(length(min = 1, max = 60))]
    pub state: String,
    pub region: Option<String>,
    pub county: Option<String>,
}

/// A news category as stored on the tenant and in its `categories`
/// subcollection (keyed by `slug`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Editorial instructions handed to the journalist covering the category.
    pub directive: String,
    pub enabled: bool,
}

/// A category as submitted by a client; the slug is checked before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub id: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub slug: Option<String>,
    pub directive: Option<String>,
    pub enabled: Option<bool>,
}

/// The current custom-domain request, if one was ever made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRequest {
    pub domain: String,
    pub status: DomainRequestStatus,
    pub requested_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub rejection_reason: Option<String>,
}

/// A document in the `tenants` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub business_name: String,
    pub slug: String,
    /// Platform subdomain, e.g. `pinehollow.newsdesk.local`.
    pub domain: String,
    pub custom_domain: Option<String>,
    pub service_area: ServiceArea,
    pub categories: Vec<Category>,
    pub status: TenantStatus,
    pub licensing_status: LicensingStatus,
    pub domain_request: Option<DomainRequest>,
    pub owner_email: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub vercel_project_id: Option<String>,
    pub site_url: Option<String>,
    /// First characters of the current API key, for display only.
    pub api_key_prefix: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tenant {
    pub fn domain_request_status(&self) -> Option<DomainRequestStatus> {
        self.domain_request.as_ref().map(|r| r.status)
    }

    /// The hostname readers should use: the approved custom domain if any.
    pub fn public_domain(&self) -> &str {
        self.custom_domain.as_deref().unwrap_or(&self.domain)
    }
}

/// Entry in `tenantSlugs`, claiming a slug for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugClaim {
    pub tenant_id: TenantId,
    pub claimed_at: Timestamp,
}

/// Entry in `tenantApiKeys`, keyed by tenant id. The key itself is never
/// stored, only its digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantApiKey {
    pub tenant_id: TenantId,
    pub key_hash: String,
    pub key_prefix: String,
    pub created_at: Timestamp,
}

/// A tenant returned together with a newly issued API key. This is the only
/// place the plaintext key ever appears.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTenant {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub api_key: String,
}

/// DTO for creating a tenant.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenant {
    #[validate(length(min = 1, max = 120))]
    pub business_name: String,
    pub slug: String,
    #[validate(nested)]
    pub service_area: ServiceArea,
    #[validate(length(min = 1, max = 40), nested)]
    pub categories: Vec<CategoryInput>,
    #[validate(email)]
    pub owner_email: Option<String>,
    pub licensing_status: Option<LicensingStatus>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub vercel_project_id: Option<String>,
}

/// DTO for a licensing status change reported by billing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLicensing {
    pub licensing_status: LicensingStatus,
    pub stripe_subscription_id: Option<String>,
}

/// DTO recording where the tenant's site was deployed.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordDeployment {
    #[validate(length(min = 1, max = 120))]
    pub vercel_project_id: String,
    #[validate(url)]
    pub site_url: String,
}

/// Result of a cascading tenant delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub tenant_id: TenantId,
    /// Whether the tenant document still existed when this run started.
    pub tenant_document_found: bool,
    /// Documents removed per collection during this run.
    pub deleted: std::collections::BTreeMap<String, usize>,
}

impl DeletionReport {
    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }
}
