//! Setup progress tracking.
//!
//! Sole writer of the `onboardingProgress` singletons. Each update is a
//! read-modify-write retried on version conflicts.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;

use newsdesk_core::error::CoreError;
use newsdesk_core::setup_progress::{category_status, is_forward, CategoryStatus, SetupStep};
use newsdesk_core::types::TenantId;
use newsdesk_db::models::setup_progress::{CategoryProgress, SetupError, SetupProgress};
use newsdesk_db::repositories::SetupProgressRepo;
use newsdesk_db::{DocumentStore, StoreError};

const MAX_UPDATE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct SetupTracker {
    store: Arc<dyn DocumentStore>,
}

impl SetupTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the tenant's progress record with one target per category.
    /// Returns the existing record untouched if there already is one.
    pub async fn initialize(
        &self,
        tenant_id: TenantId,
        targets: &[(String, u32)],
    ) -> Result<SetupProgress, CoreError> {
        if let Some(existing) = SetupProgressRepo::find(self.store.as_ref(), tenant_id).await? {
            return Ok(existing.value);
        }

        let now = Utc::now();
        let category_progress: BTreeMap<String, CategoryProgress> = targets
            .iter()
            .map(|(slug, total)| {
                (
                    slug.clone(),
                    CategoryProgress {
                        generated: 0,
                        total: *total,
                        status: CategoryStatus::Pending,
                    },
                )
            })
            .collect();
        let progress = SetupProgress {
            tenant_id,
            current_step: SetupStep::TenantCreated,
            completed_steps: BTreeSet::from([SetupStep::AccountCreated]),
            articles_generated: 0,
            total_articles: category_progress.values().map(|c| c.total).sum(),
            category_progress,
            errors: Vec::new(),
            started_at: now,
            updated_at: now,
            completed_at: None,
        };

        match SetupProgressRepo::create(self.store.as_ref(), &progress).await {
            Ok(()) => {
                tracing::info!(%tenant_id, total_articles = progress.total_articles, "Setup progress initialized");
                Ok(progress)
            }
            // Lost a race with another initializer; theirs stands.
            Err(StoreError::AlreadyExists { .. }) => self.get(tenant_id).await,
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, tenant_id: TenantId) -> Result<SetupProgress, CoreError> {
        SetupProgressRepo::find(self.store.as_ref(), tenant_id)
            .await?
            .map(|p| p.value)
            .ok_or_else(|| CoreError::not_found("SetupProgress", tenant_id))
    }

    /// Move to `step`. Never moves backwards: a stale advance leaves the
    /// record as it is.
    pub async fn advance(&self, tenant_id: TenantId, step: SetupStep) -> Result<SetupProgress, CoreError> {
        self.update(tenant_id, |progress| {
            if !is_forward(progress.current_step, step) {
                tracing::debug!(
                    %tenant_id,
                    current = progress.current_step.label(),
                    requested = step.label(),
                    "Ignoring stale setup advance"
                );
                return Ok(false);
            }
            if progress.current_step == step {
                return Ok(false);
            }

            progress.completed_steps.insert(progress.current_step);
            progress.current_step = step;
            if step == SetupStep::Complete {
                progress.completed_steps.insert(SetupStep::Complete);
                progress.completed_at = Some(Utc::now());
            }
            tracing::info!(%tenant_id, step = step.label(), "Setup advanced");
            Ok(true)
        })
        .await
    }

    /// Count one generated article for `category_slug`.
    pub async fn record_article_generated(
        &self,
        tenant_id: TenantId,
        category_slug: &str,
    ) -> Result<SetupProgress, CoreError> {
        self.update(tenant_id, |progress| {
            let category = progress.category_progress.get_mut(category_slug).ok_or_else(|| {
                CoreError::Validation(format!(
                    "Category '{category_slug}' is not tracked for this tenant"
                ))
            })?;
            category.generated += 1;
            category.status = category_status(category.generated, category.total);
            progress.articles_generated += 1;
            Ok(true)
        })
        .await
    }

    /// Append to the error log. The current step is left alone.
    pub async fn record_error(&self, tenant_id: TenantId, message: &str) -> Result<SetupProgress, CoreError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::Validation("Error message is required".to_string()));
        }
        self.update(tenant_id, |progress| {
            progress.errors.push(SetupError {
                message: message.to_string(),
                step: progress.current_step,
                at: Utc::now(),
            });
            Ok(true)
        })
        .await
    }

    /// Load, apply `change`, and write back if it reports a modification.
    async fn update<F>(&self, tenant_id: TenantId, change: F) -> Result<SetupProgress, CoreError>
    where
        F: Fn(&mut SetupProgress) -> Result<bool, CoreError>,
    {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let current = SetupProgressRepo::find(self.store.as_ref(), tenant_id)
                .await?
                .ok_or_else(|| CoreError::not_found("SetupProgress", tenant_id))?;
            let mut progress = current.value;
            if !change(&mut progress)? {
                return Ok(progress);
            }
            progress.updated_at = Utc::now();

            match SetupProgressRepo::replace(self.store.as_ref(), &progress, current.version).await {
                Ok(()) => return Ok(progress),
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(CoreError::Conflict(format!(
            "Setup progress for tenant {tenant_id} is too contended, try again"
        )))
    }
}
