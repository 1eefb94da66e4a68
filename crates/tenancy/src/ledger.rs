//! The credit ledger service.
//!
//! Owns every write to `tenantCredits` and `creditTransactions`. A debit
//! runs inside the tenant's critical section and commits the updated entry
//! (compare-and-swap on its version) together with its transaction records
//! in one batch, so the balance and the log never diverge.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use newsdesk_core::credits::{
    validate_allocation, validate_cost, Authorization, CreditBalance, CreditPool, Denial,
    LedgerStatus, TransactionType,
};
use newsdesk_core::error::CoreError;
use newsdesk_core::types::TenantId;
use newsdesk_db::models::credit::{AllocateCycle, CreditLedgerEntry, CreditTransaction, Reconciliation};
use newsdesk_db::repositories::{CreditRepo, TenantRepo};
use newsdesk_db::{DocumentStore, StoreError, Versioned};

use crate::locks::TenantLocks;
use crate::notify::{self, Notifier};
use crate::validate_input;

/// Attempts at the compare-and-swap before giving up on a contended entry.
const MAX_DEBIT_ATTEMPTS: usize = 5;

/// What a committed debit did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitReceipt {
    pub ledger_id: Uuid,
    /// One record per pool drawn from: subscription first, then overage.
    pub transactions: Vec<CreditTransaction>,
    pub balance: CreditBalance,
    pub soft_limit_crossed: bool,
}

#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn DocumentStore>,
    locks: Arc<TenantLocks>,
    notifier: Notifier,
}

impl CreditLedger {
    pub fn new(store: Arc<dyn DocumentStore>, locks: Arc<TenantLocks>, notifier: Notifier) -> Self {
        Self {
            store,
            locks,
            notifier,
        }
    }

    /// Open a billing cycle with a fresh allocation.
    ///
    /// Earlier entries are kept. Overlapping active cycles are allowed; reads
    /// pick the one that started latest.
    pub async fn allocate_cycle(
        &self,
        tenant_id: TenantId,
        input: AllocateCycle,
    ) -> Result<CreditLedgerEntry, CoreError> {
        validate_input(&input)?;
        validate_allocation(input.monthly_allocation, input.soft_limit, input.hard_limit)?;
        if input.cycle_end <= input.cycle_start {
            return Err(CoreError::Validation(
                "Cycle end must be after cycle start".to_string(),
            ));
        }
        if TenantRepo::find_by_id(self.store.as_ref(), tenant_id).await?.is_none() {
            return Err(CoreError::not_found("Tenant", tenant_id));
        }

        let overlapping = CreditRepo::list_entries(self.store.as_ref(), tenant_id)
            .await?
            .into_iter()
            .filter(|e| {
                e.value.status == LedgerStatus::Active
                    && e.value.cycle_start_date < input.cycle_end
                    && input.cycle_start < e.value.cycle_end_date
            })
            .count();
        if overlapping > 0 {
            tracing::warn!(%tenant_id, overlapping, "New credit cycle overlaps an active cycle");
        }

        let now = Utc::now();
        let entry = CreditLedgerEntry {
            id: Uuid::now_v7(),
            tenant_id,
            plan_id: input.plan_id,
            cycle_start_date: input.cycle_start,
            cycle_end_date: input.cycle_end,
            balance: CreditBalance::new(input.monthly_allocation, input.soft_limit, input.hard_limit),
            status: LedgerStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let allocation = transaction(
            &entry,
            TransactionType::Allocation,
            CreditPool::Subscription,
            entry.balance.monthly_allocation,
            &entry.balance,
            format!("Monthly allocation for plan {}", entry.plan_id),
        );
        CreditRepo::insert_entry(self.store.as_ref(), &entry, &allocation).await?;

        tracing::info!(
            %tenant_id,
            ledger_id = %entry.id,
            plan_id = %entry.plan_id,
            monthly_allocation = entry.balance.monthly_allocation,
            "Credit cycle allocated"
        );
        Ok(entry)
    }

    /// The entry for the cycle covering now, if any.
    pub async fn current_entry(&self, tenant_id: TenantId) -> Result<Option<CreditLedgerEntry>, CoreError> {
        Ok(self.load_current(tenant_id).await?.map(|e| e.value))
    }

    /// Decide whether `cost` may be spent now. Fails closed without a cycle.
    pub async fn authorize(&self, tenant_id: TenantId, cost: u64) -> Result<Authorization, CoreError> {
        validate_cost(cost)?;
        let decision = match self.load_current(tenant_id).await? {
            Some(entry) => entry.value.balance.authorize(cost),
            None => Authorization::Denied(Denial::NoActiveCycle),
        };
        tracing::debug!(%tenant_id, cost, allowed = decision.is_allowed(), "Credit authorization");
        Ok(decision)
    }

    /// Spend `cost` credits. Callers should have authorized first; a debit
    /// that no longer fits is rejected whole.
    pub async fn debit(
        &self,
        tenant_id: TenantId,
        cost: u64,
        description: &str,
    ) -> Result<DebitReceipt, CoreError> {
        validate_cost(cost)?;
        let receipt = {
            let _guard = self.locks.lock(tenant_id).await;
            self.debit_locked(tenant_id, cost, description).await?
        };
        self.after_debit(tenant_id, &receipt).await;
        Ok(receipt)
    }

    /// Authorize and debit as one critical section.
    pub async fn charge(
        &self,
        tenant_id: TenantId,
        cost: u64,
        description: &str,
    ) -> Result<DebitReceipt, CoreError> {
        validate_cost(cost)?;
        let receipt = {
            let _guard = self.locks.lock(tenant_id).await;
            let current = self.load_current(tenant_id).await?;
            let decision = match &current {
                Some(entry) => entry.value.balance.authorize(cost),
                None => Authorization::Denied(Denial::NoActiveCycle),
            };
            if let Authorization::Denied(denial) = decision {
                tracing::info!(%tenant_id, cost, ?denial, "Charge denied");
                return Err(insufficient(tenant_id, cost, denial));
            }
            self.debit_locked(tenant_id, cost, description).await?
        };
        self.after_debit(tenant_id, &receipt).await;
        Ok(receipt)
    }

    /// Transactions of a tenant, newest first.
    pub async fn transactions(
        &self,
        tenant_id: TenantId,
        limit: usize,
    ) -> Result<Vec<CreditTransaction>, CoreError> {
        Ok(CreditRepo::list_transactions(self.store.as_ref(), tenant_id, limit).await?)
    }

    /// Compare the current entry's `creditsUsed` with the sum of its debits.
    pub async fn reconcile(&self, tenant_id: TenantId) -> Result<Reconciliation, CoreError> {
        let entry = self
            .load_current(tenant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("CreditLedgerEntry", tenant_id))?
            .value;
        let transactions = CreditRepo::transactions_for_ledger(self.store.as_ref(), entry.id).await?;
        let debited_total: u64 = transactions
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Debit)
            .map(|t| t.amount)
            .sum();

        let balanced = debited_total == entry.balance.credits_used && entry.balance.is_consistent();
        if !balanced {
            tracing::error!(
                %tenant_id,
                ledger_id = %entry.id,
                credits_used = entry.balance.credits_used,
                debited_total,
                "Credit ledger does not reconcile with its transactions"
            );
        }
        Ok(Reconciliation {
            ledger_id: entry.id,
            credits_used: entry.balance.credits_used,
            debited_total,
            transaction_count: transactions.len(),
            balanced,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn load_current(
        &self,
        tenant_id: TenantId,
    ) -> Result<Option<Versioned<CreditLedgerEntry>>, CoreError> {
        Ok(CreditRepo::find_current(self.store.as_ref(), tenant_id, Utc::now()).await?)
    }

    /// Caller must hold the tenant lock.
    async fn debit_locked(
        &self,
        tenant_id: TenantId,
        cost: u64,
        description: &str,
    ) -> Result<DebitReceipt, CoreError> {
        for attempt in 1..=MAX_DEBIT_ATTEMPTS {
            let Some(Versioned { value: mut entry, version }) = self.load_current(tenant_id).await? else {
                return Err(insufficient(tenant_id, cost, Denial::NoActiveCycle));
            };

            let before = entry.balance;
            let plan = before.plan_debit(cost).map_err(|rejected| {
                tracing::info!(%tenant_id, cost, available = rejected.available, "Debit exceeds hard limit");
                CoreError::InsufficientCredits {
                    tenant_id,
                    requested: rejected.requested,
                    available: Some(rejected.available),
                }
            })?;

            entry.balance = plan.after;
            entry.updated_at = Utc::now();

            let mut transactions = Vec::with_capacity(2);
            if plan.from_subscription > 0 {
                let mut midway = before;
                midway.credits_remaining -= plan.from_subscription;
                midway.credits_used += plan.from_subscription;
                transactions.push(transaction(
                    &entry,
                    TransactionType::Debit,
                    CreditPool::Subscription,
                    plan.from_subscription,
                    &midway,
                    description.to_string(),
                ));
            }
            if plan.from_overage > 0 {
                transactions.push(transaction(
                    &entry,
                    TransactionType::Debit,
                    CreditPool::Overage,
                    plan.from_overage,
                    &plan.after,
                    description.to_string(),
                ));
            }

            match CreditRepo::commit_debit(self.store.as_ref(), &entry, version, &transactions).await {
                Ok(()) => {
                    tracing::info!(
                        %tenant_id,
                        ledger_id = %entry.id,
                        cost,
                        from_subscription = plan.from_subscription,
                        from_overage = plan.from_overage,
                        credits_remaining = plan.after.credits_remaining,
                        overage_credits = plan.after.overage_credits,
                        "Credits debited"
                    );
                    return Ok(DebitReceipt {
                        ledger_id: entry.id,
                        transactions,
                        balance: plan.after,
                        soft_limit_crossed: plan.crossed_soft_limit,
                    });
                }
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::debug!(%tenant_id, attempt, "Ledger entry changed underneath debit, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CoreError::Conflict(format!(
            "Credit ledger for tenant {tenant_id} is too contended, try again"
        )))
    }

    async fn after_debit(&self, tenant_id: TenantId, receipt: &DebitReceipt) {
        if !receipt.soft_limit_crossed {
            return;
        }
        tracing::warn!(
            %tenant_id,
            ledger_id = %receipt.ledger_id,
            credits_used = receipt.balance.credits_used,
            soft_limit = receipt.balance.soft_limit,
            "Credit soft limit exceeded"
        );
        if !self.notifier.is_enabled() {
            return;
        }
        match TenantRepo::find_by_id(self.store.as_ref(), tenant_id).await {
            Ok(Some(tenant)) => {
                let (subject, body) = notify::soft_limit_warning(&tenant.value, &receipt.balance);
                self.notifier.send_to_owner(&tenant.value, subject, body).await;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(%tenant_id, error = %e, "Could not load tenant for soft limit email"),
        }
    }
}

fn insufficient(tenant_id: TenantId, requested: u64, denial: Denial) -> CoreError {
    let available = match denial {
        Denial::NoActiveCycle => None,
        Denial::InsufficientCredits { available, .. } => Some(available),
    };
    CoreError::InsufficientCredits {
        tenant_id,
        requested,
        available,
    }
}

fn transaction(
    entry: &CreditLedgerEntry,
    transaction_type: TransactionType,
    credit_pool: CreditPool,
    amount: u64,
    balance_after: &CreditBalance,
    description: String,
) -> CreditTransaction {
    CreditTransaction {
        id: Uuid::new_v4(),
        tenant_id: entry.tenant_id,
        ledger_id: entry.id,
        transaction_type,
        credit_pool,
        amount,
        credits_used_after: balance_after.credits_used,
        credits_remaining_after: balance_after.credits_remaining,
        overage_credits_after: balance_after.overage_credits,
        description,
        created_at: Utc::now(),
    }
}
