//! Credit ledger and credit transaction document models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use newsdesk_core::credits::{CreditBalance, CreditPool, LedgerStatus, TransactionType};
use newsdesk_core::types::{TenantId, Timestamp};

/// A document in `tenantCredits`: one billing cycle of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLedgerEntry {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub plan_id: String,
    pub cycle_start_date: Timestamp,
    pub cycle_end_date: Timestamp,
    #[serde(flatten)]
    pub balance: CreditBalance,
    pub status: LedgerStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CreditLedgerEntry {
    /// Whether `at` falls inside this entry's cycle (start inclusive).
    pub fn covers(&self, at: Timestamp) -> bool {
        self.status == LedgerStatus::Active && self.cycle_start_date <= at && at < self.cycle_end_date
    }
}

/// An immutable document in `creditTransactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub ledger_id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub credit_pool: CreditPool,
    pub amount: u64,
    pub credits_used_after: u64,
    pub credits_remaining_after: u64,
    pub overage_credits_after: u64,
    pub description: String,
    pub created_at: Timestamp,
}

/// DTO for opening a billing cycle.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AllocateCycle {
    #[validate(length(min = 1, max = 60))]
    pub plan_id: String,
    pub monthly_allocation: u64,
    pub cycle_start: Timestamp,
    pub cycle_end: Timestamp,
    pub soft_limit: Option<u64>,
    pub hard_limit: Option<u64>,
}

/// Outcome of comparing the ledger against its transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub ledger_id: Uuid,
    pub credits_used: u64,
    pub debited_total: u64,
    pub transaction_count: usize,
    pub balanced: bool,
}
