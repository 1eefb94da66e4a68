//! Shared AI settings behind a process-wide TTL cache.

use std::sync::Arc;
use std::time::Duration;

use newsdesk_core::cache::TtlCache;
use newsdesk_core::error::CoreError;
use newsdesk_db::models::settings::{AiOperation, AiSettings};
use newsdesk_db::repositories::SettingsRepo;
use newsdesk_db::DocumentStore;

use crate::validate_input;

#[derive(Clone)]
pub struct AiSettingsService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<TtlCache<AiSettings>>,
}

impl AiSettingsService {
    pub fn new(store: Arc<dyn DocumentStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: Arc::new(TtlCache::new(ttl)),
        }
    }

    /// Current settings; defaults when none were ever stored.
    pub async fn get(&self) -> Result<AiSettings, CoreError> {
        if let Some(settings) = self.cache.get().await {
            return Ok(settings);
        }
        let settings = SettingsRepo::get_ai(self.store.as_ref())
            .await?
            .unwrap_or_default();
        self.cache.put(settings.clone()).await;
        tracing::debug!(ttl_secs = self.cache.ttl().as_secs(), "AI settings loaded into cache");
        Ok(settings)
    }

    pub async fn update(&self, settings: AiSettings) -> Result<AiSettings, CoreError> {
        validate_input(&settings)?;
        SettingsRepo::put_ai(self.store.as_ref(), &settings).await?;
        self.cache.invalidate().await;
        tracing::info!(model = %settings.model, "AI settings updated");
        Ok(settings)
    }

    /// Credits charged for one `operation`.
    pub async fn cost_of(&self, operation: AiOperation) -> Result<u64, CoreError> {
        Ok(self.get().await?.credit_costs.cost_of(operation))
    }
}
