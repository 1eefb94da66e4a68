//! Repository for platform-wide documents in `settings`.

use crate::error::StoreError;
use crate::models::settings::AiSettings;
use crate::store::{collections, DocumentStore, WriteBatch};

const AI_SETTINGS_ID: &str = "ai";

pub struct SettingsRepo;

impl SettingsRepo {
    /// The stored AI settings, if an operator ever saved any.
    pub async fn get_ai(store: &dyn DocumentStore) -> Result<Option<AiSettings>, StoreError> {
        store
            .get(collections::SETTINGS, AI_SETTINGS_ID)
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    pub async fn put_ai(store: &dyn DocumentStore, settings: &AiSettings) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.set(collections::SETTINGS, AI_SETTINGS_ID, settings)?;
        store.commit(batch).await
    }
}
