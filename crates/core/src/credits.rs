//! Credit arithmetic for the per-tenant, per-cycle ledger.
//!
//! A cycle starts with `monthly_allocation` credits in the subscription pool.
//! Spend drains `credits_remaining` first; once it is exhausted, spend is
//! counted in `overage_credits`, capped by `hard_limit` (0 means uncapped).
//! `credits_used` is total spend in the cycle across both pools, so at all
//! times `credits_used + credits_remaining == monthly_allocation + overage_credits`.
//!
//! Everything here is pure: the ledger service loads a [`CreditBalance`],
//! asks for a [`DebitPlan`], and commits `plan.after` together with the
//! transaction records in one batch.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default warning threshold as a percentage of the monthly allocation.
pub const DEFAULT_SOFT_LIMIT_PERCENT: u64 = 80;

/// Upper bound for any allocation, limit or single cost. Keeps every sum
/// the ledger computes far inside `u64`.
pub const MAX_CREDIT_AMOUNT: u64 = 1_000_000_000_000;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPool {
    Subscription,
    Overage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// The monthly allocation granted when a cycle opens.
    Allocation,
    /// Spend by a metered operation.
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Active,
    Closed,
}

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

/// The mutable numbers of one ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    pub monthly_allocation: u64,
    pub credits_used: u64,
    pub credits_remaining: u64,
    pub overage_credits: u64,
    pub soft_limit: u64,
    pub hard_limit: u64,
    pub soft_limit_warned: bool,
}

impl CreditBalance {
    /// A fresh cycle. `soft_limit` defaults to [`DEFAULT_SOFT_LIMIT_PERCENT`]
    /// of the allocation; `hard_limit` defaults to 0 (uncapped overage).
    pub fn new(monthly_allocation: u64, soft_limit: Option<u64>, hard_limit: Option<u64>) -> Self {
        Self {
            monthly_allocation,
            credits_used: 0,
            credits_remaining: monthly_allocation,
            overage_credits: 0,
            soft_limit: soft_limit.unwrap_or_else(|| default_soft_limit(monthly_allocation)),
            hard_limit: hard_limit.unwrap_or(0),
            soft_limit_warned: false,
        }
    }

    /// Overage headroom left under the hard limit; `None` when uncapped.
    pub fn overage_headroom(&self) -> Option<u64> {
        if self.hard_limit == 0 {
            None
        } else {
            Some(self.hard_limit.saturating_sub(self.overage_credits))
        }
    }

    /// Credits that may still be spent this cycle; `None` means unbounded.
    pub fn available(&self) -> Option<u64> {
        self.overage_headroom()
            .map(|headroom| self.credits_remaining.saturating_add(headroom))
    }

    /// Decide whether `cost` may be spent.
    pub fn authorize(&self, cost: u64) -> Authorization {
        match self.available() {
            Some(available) if available < cost => Authorization::Denied(Denial::InsufficientCredits {
                requested: cost,
                available,
            }),
            available => Authorization::Allowed { available },
        }
    }

    /// Split `cost` across the pools and compute the post-debit balance.
    ///
    /// The subscription pool is drained first and never goes below zero;
    /// the remainder is drawn from overage. If the overage part would breach
    /// the hard limit (or would not fit the counters at all) the whole debit
    /// is rejected and nothing changes.
    pub fn plan_debit(&self, cost: u64) -> Result<DebitPlan, DebitRejected> {
        let rejected = DebitRejected {
            requested: cost,
            available: self.available().unwrap_or(0),
        };
        let from_subscription = cost.min(self.credits_remaining);
        let from_overage = cost - from_subscription;

        if let Some(headroom) = self.overage_headroom() {
            if from_overage > headroom {
                return Err(rejected);
            }
        }

        let mut after = *self;
        after.credits_remaining -= from_subscription;
        after.overage_credits = after
            .overage_credits
            .checked_add(from_overage)
            .ok_or(rejected)?;
        after.credits_used = after.credits_used.checked_add(cost).ok_or(rejected)?;

        // Reaching the limit exactly is still within it.
        let crossed_soft_limit =
            !self.soft_limit_warned && self.soft_limit > 0 && after.credits_used > self.soft_limit;
        if crossed_soft_limit {
            after.soft_limit_warned = true;
        }

        Ok(DebitPlan {
            from_subscription,
            from_overage,
            after,
            crossed_soft_limit,
        })
    }

    /// The accounting identity every persisted balance must satisfy.
    pub fn is_consistent(&self) -> bool {
        u128::from(self.credits_used) + u128::from(self.credits_remaining)
            == u128::from(self.monthly_allocation) + u128::from(self.overage_credits)
    }
}

fn default_soft_limit(monthly_allocation: u64) -> u64 {
    let limit = u128::from(monthly_allocation) * u128::from(DEFAULT_SOFT_LIMIT_PERCENT) / 100;
    u64::try_from(limit).unwrap_or(monthly_allocation)
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Denial {
    /// No ledger entry covers the current moment; unmetered tenants cannot spend.
    NoActiveCycle,
    InsufficientCredits { requested: u64, available: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Authorization {
    Allowed { available: Option<u64> },
    Denied(Denial),
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// How a debit is split across pools, and the resulting balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebitPlan {
    pub from_subscription: u64,
    pub from_overage: u64,
    pub after: CreditBalance,
    /// True exactly when this debit is the one that trips the soft limit.
    pub crossed_soft_limit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebitRejected {
    pub requested: u64,
    pub available: u64,
}

/// Costs must be whole, positive credit amounts.
pub fn validate_cost(cost: u64) -> Result<(), CoreError> {
    if cost == 0 {
        return Err(CoreError::Validation(
            "Credit cost must be greater than zero".to_string(),
        ));
    }
    check_bound("Credit cost", cost)
}

/// Allocation sanity: soft and hard limits must make sense for the cycle.
pub fn validate_allocation(
    monthly_allocation: u64,
    soft_limit: Option<u64>,
    hard_limit: Option<u64>,
) -> Result<(), CoreError> {
    check_bound("Monthly allocation", monthly_allocation)?;
    if let Some(hard) = hard_limit {
        check_bound("Hard limit", hard)?;
    }
    if let Some(soft) = soft_limit {
        if soft > monthly_allocation {
            return Err(CoreError::Validation(format!(
                "Soft limit {soft} exceeds monthly allocation {monthly_allocation}"
            )));
        }
    }
    Ok(())
}

fn check_bound(what: &str, amount: u64) -> Result<(), CoreError> {
    if amount > MAX_CREDIT_AMOUNT {
        return Err(CoreError::Validation(format!(
            "{what} {amount} exceeds the maximum of {MAX_CREDIT_AMOUNT}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
