//! Repository for the top-level `aiJournalists` collection.

use serde_json::Value;

use newsdesk_core::types::TenantId;

use crate::error::StoreError;
use crate::models::journalist::AiJournalist;
use crate::store::{collections, DocumentStore, WriteBatch, MAX_BATCH_WRITES};

pub struct JournalistRepo;

impl JournalistRepo {
    /// Upsert journalists by their deterministic document id.
    pub async fn upsert_many(
        store: &dyn DocumentStore,
        journalists: &[AiJournalist],
    ) -> Result<usize, StoreError> {
        for chunk in journalists.chunks(MAX_BATCH_WRITES) {
            let mut batch = WriteBatch::new();
            for journalist in chunk {
                batch.set(collections::AI_JOURNALISTS, journalist.id.clone(), journalist)?;
            }
            store.commit(batch).await?;
        }
        Ok(journalists.len())
    }

    pub async fn list_by_tenant(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
    ) -> Result<Vec<AiJournalist>, StoreError> {
        store
            .query_eq(
                collections::AI_JOURNALISTS,
                "tenantId",
                &Value::String(tenant_id.to_string()),
                None,
            )
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }
}
