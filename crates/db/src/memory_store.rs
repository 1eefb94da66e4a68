//! In-process implementation of [`DocumentStore`].
//!
//! Used by the test suites and for local development without PostgreSQL.
//! Semantics match [`PgDocumentStore`](crate::PgDocumentStore): batches are
//! staged against a copy of the data and swapped in only if every write
//! succeeds.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::store::{Document, DocumentStore, WriteBatch, WriteOp};

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

#[derive(Default)]
pub struct MemoryDocumentStore {
    data: RwLock<Collections>,
    /// Collection path prefixes, each with the number of matching commits
    /// still to let through before one fails.
    injected_failures: Mutex<Vec<(String, usize)>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit that writes to a collection starting with
    /// `collection_prefix` fail with [`StoreError::Unavailable`], leaving
    /// the data untouched. Each injection fires once.
    pub async fn fail_next_commit_touching(&self, collection_prefix: impl Into<String>) {
        self.fail_nth_commit_touching(collection_prefix, 1).await;
    }

    /// Like [`fail_next_commit_touching`](Self::fail_next_commit_touching),
    /// but the first `n - 1` matching commits go through.
    pub async fn fail_nth_commit_touching(&self, collection_prefix: impl Into<String>, n: usize) {
        self.injected_failures
            .lock()
            .await
            .push((collection_prefix.into(), n.saturating_sub(1)));
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.data
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    async fn take_injected_failure(&self, batch: &WriteBatch) -> Option<String> {
        let mut failures = self.injected_failures.lock().await;
        let mut fired = None;
        for (index, (prefix, skip)) in failures.iter_mut().enumerate() {
            let touches = batch
                .ops()
                .iter()
                .any(|op| op.collection().starts_with(prefix.as_str()));
            if !touches {
                continue;
            }
            if *skip == 0 {
                fired = Some(index);
                break;
            }
            *skip -= 1;
        }
        fired.map(|index| failures.remove(index).0)
    }

    fn apply(staged: &mut Collections, op: WriteOp) -> Result<(), StoreError> {
        let now = Utc::now();
        match op {
            WriteOp::Create {
                collection,
                id,
                data,
            } => {
                let docs = staged.entry(collection.clone()).or_default();
                if docs.contains_key(&id) {
                    return Err(StoreError::AlreadyExists { collection, id });
                }
                docs.insert(
                    id.clone(),
                    Document {
                        collection,
                        id,
                        data,
                        version: 1,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
            WriteOp::Set {
                collection,
                id,
                data,
            } => {
                let docs = staged.entry(collection.clone()).or_default();
                match docs.get_mut(&id) {
                    Some(existing) => {
                        existing.data = data;
                        existing.version += 1;
                        existing.updated_at = now;
                    }
                    None => {
                        docs.insert(
                            id.clone(),
                            Document {
                                collection,
                                id,
                                data,
                                version: 1,
                                created_at: now,
                                updated_at: now,
                            },
                        );
                    }
                }
            }
            WriteOp::Update {
                collection,
                id,
                data,
                expected_version,
            } => {
                let Some(existing) = staged.get_mut(&collection).and_then(|docs| docs.get_mut(&id))
                else {
                    return Err(StoreError::Missing { collection, id });
                };
                if expected_version.is_some_and(|v| v != existing.version) {
                    return Err(StoreError::VersionConflict { collection, id });
                }
                existing.data = data;
                existing.version += 1;
                existing.updated_at = now;
            }
            WriteOp::Delete { collection, id } => {
                if let Some(docs) = staged.get_mut(&collection) {
                    docs.remove(&id);
                    if docs.is_empty() {
                        staged.remove(&collection);
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .data
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let data = self.data.read().await;
        let Some(docs) = data.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .values()
            .filter(|doc| doc.data.get(field) == Some(value))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .get(collection)
            .map(|docs| docs.values().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.check_size()?;
        if batch.is_empty() {
            return Ok(());
        }
        if let Some(prefix) = self.take_injected_failure(&batch).await {
            return Err(StoreError::Unavailable(format!(
                "injected failure for collections under '{prefix}'"
            )));
        }

        let mut data = self.data.write().await;
        let mut staged = data.clone();
        for op in batch.into_ops() {
            Self::apply(&mut staged, op)?;
        }
        *data = staged;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
