//! Repository for `tenantCredits` ledger entries and the append-only
//! `creditTransactions` log.

use serde_json::Value;
use uuid::Uuid;

use newsdesk_core::types::{TenantId, Timestamp};

use crate::error::StoreError;
use crate::models::credit::{CreditLedgerEntry, CreditTransaction};
use crate::store::{collections, DocumentStore, Versioned, WriteBatch};

pub struct CreditRepo;

impl CreditRepo {
    /// All ledger entries of a tenant, any status.
    pub async fn list_entries(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
    ) -> Result<Vec<Versioned<CreditLedgerEntry>>, StoreError> {
        store
            .query_eq(
                collections::TENANT_CREDITS,
                "tenantId",
                &Value::String(tenant_id.to_string()),
                None,
            )
            .await?
            .iter()
            .map(|doc| doc.decode_versioned())
            .collect()
    }

    /// The active entry covering `at`. When cycles overlap, the one that
    /// started latest wins.
    pub async fn find_current(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
        at: Timestamp,
    ) -> Result<Option<Versioned<CreditLedgerEntry>>, StoreError> {
        let entries = Self::list_entries(store, tenant_id).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.value.covers(at))
            .max_by_key(|e| (e.value.cycle_start_date, e.value.created_at)))
    }

    pub async fn find_by_id(
        store: &dyn DocumentStore,
        ledger_id: Uuid,
    ) -> Result<Option<Versioned<CreditLedgerEntry>>, StoreError> {
        store
            .get(collections::TENANT_CREDITS, &ledger_id.to_string())
            .await?
            .map(|doc| doc.decode_versioned())
            .transpose()
    }

    /// Insert a new entry together with its allocation record.
    pub async fn insert_entry(
        store: &dyn DocumentStore,
        entry: &CreditLedgerEntry,
        allocation: &CreditTransaction,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.create(collections::TENANT_CREDITS, entry.id.to_string(), entry)?;
        batch.create(
            collections::CREDIT_TRANSACTIONS,
            allocation.id.to_string(),
            allocation,
        )?;
        store.commit(batch).await
    }

    /// Write the post-debit entry and its transaction records atomically,
    /// provided nobody else wrote the entry since `expected_version`.
    pub async fn commit_debit(
        store: &dyn DocumentStore,
        entry: &CreditLedgerEntry,
        expected_version: i64,
        transactions: &[CreditTransaction],
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.update(
            collections::TENANT_CREDITS,
            entry.id.to_string(),
            entry,
            Some(expected_version),
        )?;
        for txn in transactions {
            batch.create(collections::CREDIT_TRANSACTIONS, txn.id.to_string(), txn)?;
        }
        store.commit(batch).await
    }

    /// Transactions of a tenant, newest first.
    pub async fn list_transactions(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
        limit: usize,
    ) -> Result<Vec<CreditTransaction>, StoreError> {
        let mut txns: Vec<CreditTransaction> = store
            .query_eq(
                collections::CREDIT_TRANSACTIONS,
                "tenantId",
                &Value::String(tenant_id.to_string()),
                None,
            )
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect::<Result<_, _>>()?;
        txns.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        txns.truncate(limit);
        Ok(txns)
    }

    /// Every transaction recorded against one ledger entry.
    pub async fn transactions_for_ledger(
        store: &dyn DocumentStore,
        ledger_id: Uuid,
    ) -> Result<Vec<CreditTransaction>, StoreError> {
        store
            .query_eq(
                collections::CREDIT_TRANSACTIONS,
                "ledgerId",
                &Value::String(ledger_id.to_string()),
                None,
            )
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }
}
