//! Onboarding session document model and DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use newsdesk_core::onboarding::{DomainOption, OnboardingStatus};
use newsdesk_core::types::{TenantId, Timestamp};

use super::tenant::{CategoryInput, ServiceArea};

/// A document in `onboardingSessions`, keyed by its resume token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingSession {
    pub resume_token: String,
    pub domain_option: Option<DomainOption>,
    pub domain: Option<String>,
    pub service_area: Option<ServiceArea>,
    pub selected_categories: Vec<CategoryInput>,
    pub owner_email: Option<String>,
    pub newspaper_name: Option<String>,
    pub current_step: u8,
    pub status: OnboardingStatus,
    /// Id of the tenant being created from this session, fixed when
    /// provisioning starts so an interrupted run can be resumed.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for a wizard save. Carries the full accumulated wizard state; the
/// stored session is overwritten, not merged.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveOnboardingSession {
    pub resume_token: Option<String>,
    pub domain_option: Option<DomainOption>,
    #[validate(length(max = 253))]
    pub domain: Option<String>,
    #[validate(nested)]
    pub service_area: Option<ServiceArea>,
    #[serde(default)]
    #[validate(length(max = 40), nested)]
    pub selected_categories: Vec<CategoryInput>,
    #[validate(email)]
    pub owner_email: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub newspaper_name: Option<String>,
    #[validate(range(min = 1, max = 6))]
    pub current_step: u8,
}
