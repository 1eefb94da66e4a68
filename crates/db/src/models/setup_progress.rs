//! Setup progress document model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use newsdesk_core::setup_progress::{percent_complete, CategoryStatus, SetupStep};
use newsdesk_core::types::{TenantId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub generated: u32,
    pub total: u32,
    pub status: CategoryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupError {
    pub message: String,
    pub step: SetupStep,
    pub at: Timestamp,
}

/// The per-tenant singleton in `onboardingProgress`, keyed by tenant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupProgress {
    pub tenant_id: TenantId,
    pub current_step: SetupStep,
    pub completed_steps: BTreeSet<SetupStep>,
    pub articles_generated: u32,
    pub total_articles: u32,
    /// Keyed by category slug.
    pub category_progress: BTreeMap<String, CategoryProgress>,
    pub errors: Vec<SetupError>,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl SetupProgress {
    pub fn percent_complete(&self) -> u8 {
        percent_complete(self.current_step, self.articles_generated, self.total_articles)
    }
}

/// Setup progress as returned to polling clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupProgressView {
    #[serde(flatten)]
    pub progress: SetupProgress,
    pub percent_complete: u8,
}

impl From<SetupProgress> for SetupProgressView {
    fn from(progress: SetupProgress) -> Self {
        let percent_complete = progress.percent_complete();
        Self {
            progress,
            percent_complete,
        }
    }
}
