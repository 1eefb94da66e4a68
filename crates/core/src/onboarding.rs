//! Signup wizard constants and validation.
//!
//! Defines the wizard steps, session status values and the checks the
//! onboarding store applies before a session may be turned into a tenant.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    InProgress,
    /// A tenant is being created from this session.
    Seeding,
    /// Terminal: the tenant exists.
    Complete,
}

impl OnboardingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Seeding => "seeding",
            Self::Complete => "complete",
        }
    }
}

// ---------------------------------------------------------------------------
// Wizard steps
// ---------------------------------------------------------------------------

/// The six steps of the signup wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Domain,
    ServiceArea,
    Categories,
    Newspaper,
    Owner,
    Review,
}

pub const MIN_STEP: u8 = 1;
pub const MAX_STEP: u8 = 6;

impl WizardStep {
    /// Convert a 1-based step number.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::Domain),
            2 => Ok(Self::ServiceArea),
            3 => Ok(Self::Categories),
            4 => Ok(Self::Newspaper),
            5 => Ok(Self::Owner),
            6 => Ok(Self::Review),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    pub fn to_number(self) -> u8 {
        match self {
            Self::Domain => 1,
            Self::ServiceArea => 2,
            Self::Categories => 3,
            Self::Newspaper => 4,
            Self::Owner => 5,
            Self::Review => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Domain => "Domain",
            Self::ServiceArea => "Service Area",
            Self::Categories => "Categories",
            Self::Newspaper => "Newspaper",
            Self::Owner => "Owner",
            Self::Review => "Review",
        }
    }
}

/// How the new paper will be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainOption {
    /// Served from `{slug}.{platform domain}` only.
    Subdomain,
    /// The owner brings a domain; it goes through the domain request review.
    CustomDomain,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_step_number(step: u8) -> Result<(), CoreError> {
    WizardStep::from_number(step).map(|_| ())
}

/// Saves are only accepted while the wizard is still being filled in.
pub fn can_save_session(status: OnboardingStatus) -> Result<(), CoreError> {
    if status != OnboardingStatus::InProgress {
        return Err(CoreError::Conflict(format!(
            "Onboarding session is '{}' and can no longer be edited",
            status.as_str()
        )));
    }
    Ok(())
}

/// A session may be provisioned once it reaches the review step. A session
/// left in `seeding` by an interrupted run may be provisioned again to
/// finish the job.
pub fn can_provision(current_step: u8, status: OnboardingStatus) -> Result<(), CoreError> {
    if status == OnboardingStatus::Complete {
        return Err(CoreError::Conflict(
            "Onboarding session has already been provisioned".to_string(),
        ));
    }
    if current_step != MAX_STEP {
        return Err(CoreError::Validation(format!(
            "Cannot provision: wizard must be on step {MAX_STEP} (Review), \
             currently on step {current_step}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
