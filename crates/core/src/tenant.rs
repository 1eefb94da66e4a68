//! Tenant status machines: lifecycle status, licensing status and the
//! orthogonal custom-domain request.
//!
//! ```text
//! provisioning -> seeding -> active <-> suspended
//!
//! domain request:  none -> pending -> approved | rejected
//!                  (approved/rejected) -> pending   (a new request)
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Tenant status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Provisioning,
    Seeding,
    Active,
    Suspended,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioning => "provisioning",
            Self::Seeding => "seeding",
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Provisioning, Self::Seeding)
                | (Self::Seeding, Self::Active)
                | (Self::Active, Self::Suspended)
                | (Self::Suspended, Self::Active)
        )
    }
}

/// Validate a lifecycle transition, failing with `Conflict` if the tenant is
/// not in a state the transition starts from.
pub fn validate_status_transition(from: TenantStatus, to: TenantStatus) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot move tenant from '{}' to '{}'",
            from.as_str(),
            to.as_str()
        )))
    }
}

// ---------------------------------------------------------------------------
// Licensing status
// ---------------------------------------------------------------------------

/// Billing-side licence state, reported by the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicensingStatus {
    Trial,
    Active,
    PastDue,
    Canceled,
}

impl LicensingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }

    /// Whether the licence allows the site to be served.
    pub fn is_in_good_standing(self) -> bool {
        matches!(self, Self::Trial | Self::Active)
    }
}

/// The lifecycle status a licensing change implies, if any.
///
/// Only the `active <-> suspended` side transition is driven by billing;
/// tenants that are still provisioning or seeding just record the licence.
pub fn status_for_licensing(
    current: TenantStatus,
    licensing: LicensingStatus,
) -> Option<TenantStatus> {
    match (current, licensing.is_in_good_standing()) {
        (TenantStatus::Active, false) => Some(TenantStatus::Suspended),
        (TenantStatus::Suspended, true) => Some(TenantStatus::Active),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Domain request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl DomainRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A new request may start unless one is already awaiting review.
pub fn can_submit_domain_request(current: Option<DomainRequestStatus>) -> Result<(), CoreError> {
    match current {
        Some(DomainRequestStatus::Pending) => Err(CoreError::Conflict(
            "A domain request is already pending review".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Approval and rejection are only valid for a pending request.
pub fn can_review_domain_request(current: Option<DomainRequestStatus>) -> Result<(), CoreError> {
    match current {
        Some(DomainRequestStatus::Pending) => Ok(()),
        Some(other) => Err(CoreError::Conflict(format!(
            "Domain request is '{}', not pending",
            other.as_str()
        ))),
        None => Err(CoreError::Conflict(
            "Tenant has no domain request to review".to_string(),
        )),
    }
}

static HOSTNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
        .expect("hostname pattern is a valid regex")
});

/// Normalise and validate a custom domain (`www.Example.com` -> `www.example.com`).
pub fn normalize_domain(domain: &str) -> Result<String, CoreError> {
    let normalized = domain.trim().trim_end_matches('.').to_lowercase();
    if normalized.len() > 253 || !HOSTNAME_PATTERN.is_match(&normalized) {
        return Err(CoreError::Validation(format!(
            "'{domain}' is not a valid domain name"
        )));
    }
    Ok(normalized)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
