//! PostgreSQL implementation of [`DocumentStore`] over a single JSONB table.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use newsdesk_core::types::Timestamp;

use crate::error::StoreError;
use crate::store::{Document, DocumentStore, WriteBatch, WriteOp};

/// Column list for `documents` queries.
const COLUMNS: &str = "collection, doc_id, data, version, created_at, updated_at";

#[derive(Debug, FromRow)]
struct DocumentRow {
    collection: String,
    doc_id: String,
    data: Value,
    version: i64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            collection: row.collection,
            id: row.doc_id,
            data: row.data,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn apply(tx: &mut Transaction<'_, Postgres>, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::Create {
                collection,
                id,
                data,
            } => {
                let result = sqlx::query(
                    "INSERT INTO documents (collection, doc_id, data) \
                     VALUES ($1, $2, $3) \
                     ON CONFLICT (collection, doc_id) DO NOTHING",
                )
                .bind(collection)
                .bind(id)
                .bind(data)
                .execute(&mut **tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::AlreadyExists {
                        collection: collection.clone(),
                        id: id.clone(),
                    });
                }
            }
            WriteOp::Set {
                collection,
                id,
                data,
            } => {
                sqlx::query(
                    "INSERT INTO documents (collection, doc_id, data) \
                     VALUES ($1, $2, $3) \
                     ON CONFLICT (collection, doc_id) DO UPDATE \
                     SET data = EXCLUDED.data, \
                         version = documents.version + 1, \
                         updated_at = now()",
                )
                .bind(collection)
                .bind(id)
                .bind(data)
                .execute(&mut **tx)
                .await?;
            }
            WriteOp::Update {
                collection,
                id,
                data,
                expected_version,
            } => {
                let result = sqlx::query(
                    "UPDATE documents \
                     SET data = $3, version = version + 1, updated_at = now() \
                     WHERE collection = $1 AND doc_id = $2 \
                       AND ($4::BIGINT IS NULL OR version = $4)",
                )
                .bind(collection)
                .bind(id)
                .bind(data)
                .bind(expected_version)
                .execute(&mut **tx)
                .await?;
                if result.rows_affected() == 0 {
                    let exists: (bool,) = sqlx::query_as(
                        "SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND doc_id = $2)",
                    )
                    .bind(collection)
                    .bind(id)
                    .fetch_one(&mut **tx)
                    .await?;
                    return Err(if exists.0 {
                        StoreError::VersionConflict {
                            collection: collection.clone(),
                            id: id.clone(),
                        }
                    } else {
                        StoreError::Missing {
                            collection: collection.clone(),
                            id: id.clone(),
                        }
                    });
                }
            }
            WriteOp::Delete { collection, id } => {
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND doc_id = $2")
                    .bind(collection)
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE collection = $1 AND doc_id = $2");
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        // LIMIT NULL means no limit in PostgreSQL.
        let query = format!(
            "SELECT {COLUMNS} FROM documents \
             WHERE collection = $1 AND data -> $2 = $3 \
             ORDER BY doc_id \
             LIMIT $4"
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(collection)
            .bind(field)
            .bind(value)
            .bind(limit.map(|l| l as i64))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents \
             WHERE collection = $1 \
             ORDER BY doc_id \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(collection)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.check_size()?;
        if batch.is_empty() {
            return Ok(());
        }

        // Any error drops `tx`, which rolls the whole batch back.
        let mut tx = self.pool.begin().await?;
        for op in batch.ops() {
            Self::apply(&mut tx, op).await?;
        }
        tx.commit().await?;

        tracing::trace!(writes = batch.len(), "Committed document batch");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
