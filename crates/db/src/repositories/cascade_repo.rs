//! Page-at-a-time deletes used by the tenant cascade.
//!
//! Each call removes at most [`MAX_BATCH_WRITES`] documents in one atomic
//! batch and reports how many it removed; callers loop until it returns 0.

use serde_json::Value;

use crate::error::StoreError;
use crate::store::{DocumentStore, WriteBatch, MAX_BATCH_WRITES};

pub struct CascadeRepo;

impl CascadeRepo {
    /// Delete one page of documents from `collection`.
    pub async fn delete_page(store: &dyn DocumentStore, collection: &str) -> Result<usize, StoreError> {
        let docs = store.list(collection, MAX_BATCH_WRITES).await?;
        Self::delete_docs(store, collection, docs.iter().map(|d| d.id.as_str())).await
    }

    /// Delete one page of documents from `collection` whose `field` equals `value`.
    pub async fn delete_matching_page(
        store: &dyn DocumentStore,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<usize, StoreError> {
        let docs = store
            .query_eq(collection, field, value, Some(MAX_BATCH_WRITES))
            .await?;
        Self::delete_docs(store, collection, docs.iter().map(|d| d.id.as_str())).await
    }

    async fn delete_docs<'a>(
        store: &dyn DocumentStore,
        collection: &str,
        ids: impl Iterator<Item = &'a str>,
    ) -> Result<usize, StoreError> {
        let mut batch = WriteBatch::new();
        for id in ids {
            batch.delete(collection, id);
        }
        let deleted = batch.len();
        store.commit(batch).await?;
        Ok(deleted)
    }
}
