//! Setup step ordering and completion percentage for tenant provisioning.
//!
//! Steps are totally ordered by ordinal. A tenant's current step may only
//! move forward; progress reporting blends the step ordinal (30%) with the
//! article generation counters (70%).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Weight of step progress in [`percent_complete`].
pub const STEP_WEIGHT: f64 = 0.3;

/// Weight of article progress in [`percent_complete`].
pub const ARTICLE_WEIGHT: f64 = 0.7;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStep {
    AccountCreated,
    TenantCreated,
    CategoriesSeeded,
    JournalistsSeeded,
    CreditsAllocated,
    SiteDeployed,
    DomainConfigured,
    GeneratingArticles,
    ArticlesGenerated,
    Complete,
}

impl SetupStep {
    pub const ALL: [SetupStep; 10] = [
        Self::AccountCreated,
        Self::TenantCreated,
        Self::CategoriesSeeded,
        Self::JournalistsSeeded,
        Self::CreditsAllocated,
        Self::SiteDeployed,
        Self::DomainConfigured,
        Self::GeneratingArticles,
        Self::ArticlesGenerated,
        Self::Complete,
    ];

    /// Zero-based position in the setup sequence.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Ordinal of the final step.
    pub fn max_ordinal() -> u8 {
        Self::Complete.ordinal()
    }

    pub fn from_ordinal(n: u8) -> Result<Self, CoreError> {
        Self::ALL.get(n as usize).copied().ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid setup step ordinal {n}. Must be between 0 and {}",
                Self::max_ordinal()
            ))
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AccountCreated => "Account Created",
            Self::TenantCreated => "Tenant Created",
            Self::CategoriesSeeded => "Categories Seeded",
            Self::JournalistsSeeded => "Journalists Seeded",
            Self::CreditsAllocated => "Credits Allocated",
            Self::SiteDeployed => "Site Deployed",
            Self::DomainConfigured => "Domain Configured",
            Self::GeneratingArticles => "Generating Articles",
            Self::ArticlesGenerated => "Articles Generated",
            Self::Complete => "Complete",
        }
    }
}

/// Whether moving from `current` to `next` respects the monotonic guard.
/// Re-advancing to the current step is allowed (it is a no-op).
pub fn is_forward(current: SetupStep, next: SetupStep) -> bool {
    next.ordinal() >= current.ordinal()
}

// ---------------------------------------------------------------------------
// Category progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    Pending,
    InProgress,
    Complete,
}

/// Status a category should have after `generated` of `total` articles.
pub fn category_status(generated: u32, total: u32) -> CategoryStatus {
    if total > 0 && generated >= total {
        CategoryStatus::Complete
    } else if generated > 0 {
        CategoryStatus::InProgress
    } else {
        CategoryStatus::Pending
    }
}

// ---------------------------------------------------------------------------
// Percentage
// ---------------------------------------------------------------------------

/// Weighted completion percentage, clamped to `0..=100`.
///
/// `round(100 * (0.3 * step/max_step + 0.7 * generated/total))`; the article
/// term is zero when `total_articles == 0`.
pub fn percent_complete(step: SetupStep, articles_generated: u32, total_articles: u32) -> u8 {
    let step_fraction = f64::from(step.ordinal()) / f64::from(SetupStep::max_ordinal());
    let article_fraction = if total_articles == 0 {
        0.0
    } else {
        f64::from(articles_generated) / f64::from(total_articles)
    };

    let percent = (100.0 * (STEP_WEIGHT * step_fraction + ARTICLE_WEIGHT * article_fraction)).round();
    percent.clamp(0.0, 100.0) as u8
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
