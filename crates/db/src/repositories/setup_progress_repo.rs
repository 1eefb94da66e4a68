//! Repository for the per-tenant `onboardingProgress` singleton.

use newsdesk_core::types::TenantId;

use crate::error::StoreError;
use crate::models::setup_progress::SetupProgress;
use crate::store::{collections, DocumentStore, Versioned, WriteBatch};

pub struct SetupProgressRepo;

impl SetupProgressRepo {
    pub async fn find(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
    ) -> Result<Option<Versioned<SetupProgress>>, StoreError> {
        store
            .get(collections::ONBOARDING_PROGRESS, &tenant_id.to_string())
            .await?
            .map(|doc| doc.decode_versioned())
            .transpose()
    }

    /// Insert the record; fails with `AlreadyExists` if the tenant has one.
    pub async fn create(store: &dyn DocumentStore, progress: &SetupProgress) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.create(
            collections::ONBOARDING_PROGRESS,
            progress.tenant_id.to_string(),
            progress,
        )?;
        store.commit(batch).await
    }

    /// Compare-and-swap replacement.
    pub async fn replace(
        store: &dyn DocumentStore,
        progress: &SetupProgress,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.update(
            collections::ONBOARDING_PROGRESS,
            progress.tenant_id.to_string(),
            progress,
            Some(expected_version),
        )?;
        store.commit(batch).await
    }

    pub async fn delete(store: &dyn DocumentStore, tenant_id: TenantId) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(collections::ONBOARDING_PROGRESS, tenant_id.to_string());
        store.commit(batch).await
    }
}
