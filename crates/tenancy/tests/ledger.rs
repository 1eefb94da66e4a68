//! Credit ledger behaviour against the in-memory store.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};

use newsdesk_core::credits::{Authorization, CreditPool, Denial, TransactionType};
use newsdesk_core::error::CoreError;
use newsdesk_db::{collections, DocumentStore};

use common::{create_tenant, cycle, harness};

#[tokio::test]
async fn authorize_fails_closed_without_a_cycle() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;

    let decision = h.services.ledger.authorize(tenant.id, 10).await.unwrap();
    assert_eq!(decision, Authorization::Denied(Denial::NoActiveCycle));

    assert_matches!(
        h.services.ledger.charge(tenant.id, 10, "article").await,
        Err(CoreError::InsufficientCredits { available: None, .. })
    );
}

#[tokio::test]
async fn debit_within_allocation_writes_one_transaction() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    h.services.ledger.allocate_cycle(tenant.id, cycle(100, None)).await.unwrap();

    assert!(h.services.ledger.authorize(tenant.id, 30).await.unwrap().is_allowed());
    let receipt = h.services.ledger.debit(tenant.id, 30, "article").await.unwrap();

    assert_eq!(receipt.transactions.len(), 1);
    assert_eq!(receipt.transactions[0].amount, 30);
    assert_eq!(receipt.transactions[0].credit_pool, CreditPool::Subscription);
    assert_eq!(receipt.balance.credits_remaining, 70);

    let entry = h.services.ledger.current_entry(tenant.id).await.unwrap().unwrap();
    assert_eq!(entry.balance.credits_remaining, 70);
    assert_eq!(entry.balance.credits_used, 30);
    assert_eq!(
        entry.balance.credits_used + entry.balance.credits_remaining,
        entry.balance.monthly_allocation
    );

    // Allocation record plus the debit.
    assert_eq!(h.store.count(collections::CREDIT_TRANSACTIONS).await, 2);
}

#[tokio::test]
async fn exhausted_subscription_draws_from_uncapped_overage() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    h.services.ledger.allocate_cycle(tenant.id, cycle(100, None)).await.unwrap();
    h.services.ledger.debit(tenant.id, 100, "bulk").await.unwrap();

    let receipt = h.services.ledger.debit(tenant.id, 5, "article").await.unwrap();
    assert_eq!(receipt.balance.credits_remaining, 0);
    assert_eq!(receipt.balance.overage_credits, 5);
    assert_eq!(receipt.transactions.len(), 1);
    assert_eq!(receipt.transactions[0].credit_pool, CreditPool::Overage);
}

#[tokio::test]
async fn split_debit_records_one_transaction_per_pool() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    h.services.ledger.allocate_cycle(tenant.id, cycle(100, None)).await.unwrap();
    h.services.ledger.debit(tenant.id, 95, "bulk").await.unwrap();

    let receipt = h.services.ledger.debit(tenant.id, 10, "article").await.unwrap();
    let pools: Vec<_> = receipt.transactions.iter().map(|t| (t.credit_pool, t.amount)).collect();
    assert_eq!(pools, vec![(CreditPool::Subscription, 5), (CreditPool::Overage, 5)]);
    assert_eq!(receipt.transactions[0].credits_remaining_after, 0);
    assert_eq!(receipt.transactions[0].overage_credits_after, 0);
    assert_eq!(receipt.transactions[1].overage_credits_after, 5);
    assert!(receipt.balance.is_consistent());
}

#[tokio::test]
async fn hard_limit_denies_and_leaves_ledger_untouched() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    h.services.ledger.allocate_cycle(tenant.id, cycle(100, Some(10))).await.unwrap();
    h.services.ledger.debit(tenant.id, 110, "bulk").await.unwrap();

    let before = h.store.list(collections::TENANT_CREDITS, 10).await.unwrap();
    let txns_before = h.store.count(collections::CREDIT_TRANSACTIONS).await;

    assert_matches!(
        h.services.ledger.authorize(tenant.id, 1).await.unwrap(),
        Authorization::Denied(Denial::InsufficientCredits { requested: 1, available: 0 })
    );
    assert_matches!(
        h.services.ledger.debit(tenant.id, 1, "article").await,
        Err(CoreError::InsufficientCredits { requested: 1, available: Some(0), .. })
    );

    assert_eq!(h.store.list(collections::TENANT_CREDITS, 10).await.unwrap(), before);
    assert_eq!(h.store.count(collections::CREDIT_TRANSACTIONS).await, txns_before);
}

#[tokio::test]
async fn soft_limit_warns_exactly_once() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    let entry = h.services.ledger.allocate_cycle(tenant.id, cycle(2000, None)).await.unwrap();
    assert_eq!(entry.balance.soft_limit, 1600);

    let mut crossings = 0;
    for _ in 0..17 {
        let receipt = h.services.ledger.charge(tenant.id, 100, "article").await.unwrap();
        if receipt.soft_limit_crossed {
            crossings += 1;
            // Sitting exactly on the limit is fine; going past it warns.
            assert_eq!(receipt.balance.credits_used, 1700);
        }
        assert_eq!(receipt.balance.soft_limit_warned, receipt.balance.credits_used > 1600);
    }
    assert_eq!(crossings, 1);

    let entry = h.services.ledger.current_entry(tenant.id).await.unwrap().unwrap();
    assert_eq!(entry.balance.credits_used, 1700);
    assert!(entry.balance.soft_limit_warned);

    let warnings: Vec<_> = h
        .email
        .subjects()
        .into_iter()
        .filter(|s| s.contains("credit usage warning"))
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
async fn failing_email_does_not_undo_the_debit() {
    let h = harness();
    h.email.fail.store(true, std::sync::atomic::Ordering::SeqCst);
    let tenant = create_tenant(&h, "pinehollow").await;
    h.services.ledger.allocate_cycle(tenant.id, cycle(100, None)).await.unwrap();

    let receipt = h.services.ledger.charge(tenant.id, 90, "article").await.unwrap();
    assert!(receipt.soft_limit_crossed);
    let entry = h.services.ledger.current_entry(tenant.id).await.unwrap().unwrap();
    assert_eq!(entry.balance.credits_used, 90);
}

#[tokio::test]
async fn concurrent_charges_cannot_overdraw() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    // 100 subscription credits plus 1 credit of overage headroom.
    h.services.ledger.allocate_cycle(tenant.id, cycle(100, Some(1))).await.unwrap();

    let ledger = Arc::new(h.services.ledger.clone());
    let tenant_id = tenant.id;
    let spawn_charge = |label: &'static str| {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move { ledger.charge(tenant_id, 60, label).await })
    };
    let (a, b) = (spawn_charge("a"), spawn_charge("b"));
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(CoreError::InsufficientCredits { .. }))));

    let entry = ledger.current_entry(tenant_id).await.unwrap().unwrap();
    assert_eq!(entry.balance.credits_used, 60);
    assert!(entry.balance.is_consistent());
}

#[tokio::test]
async fn latest_overlapping_cycle_wins() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    let now = Utc::now();

    let mut older = cycle(100, None);
    older.cycle_start = now - Duration::days(10);
    older.plan_id = "starter".to_string();
    h.services.ledger.allocate_cycle(tenant.id, older).await.unwrap();

    let mut newer = cycle(500, None);
    newer.cycle_start = now - Duration::days(2);
    h.services.ledger.allocate_cycle(tenant.id, newer).await.unwrap();

    let current = h.services.ledger.current_entry(tenant.id).await.unwrap().unwrap();
    assert_eq!(current.plan_id, "growth");
    assert_eq!(current.balance.monthly_allocation, 500);
    // The older entry is retained.
    assert_eq!(h.store.count(collections::TENANT_CREDITS).await, 2);
}

#[tokio::test]
async fn expired_cycle_is_not_current() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    let now = Utc::now();
    let mut past = cycle(100, None);
    past.cycle_start = now - Duration::days(60);
    past.cycle_end = now - Duration::days(30);
    h.services.ledger.allocate_cycle(tenant.id, past).await.unwrap();

    assert!(h.services.ledger.current_entry(tenant.id).await.unwrap().is_none());
}

#[tokio::test]
async fn allocation_rejects_bad_input() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;

    let mut inverted = cycle(100, None);
    std::mem::swap(&mut inverted.cycle_start, &mut inverted.cycle_end);
    assert_matches!(
        h.services.ledger.allocate_cycle(tenant.id, inverted).await,
        Err(CoreError::Validation(_))
    );

    let mut soft_too_high = cycle(100, None);
    soft_too_high.soft_limit = Some(150);
    assert_matches!(
        h.services.ledger.allocate_cycle(tenant.id, soft_too_high).await,
        Err(CoreError::Validation(_))
    );

    assert_matches!(
        h.services.ledger.allocate_cycle(tenant.id, cycle(u64::MAX / 2, None)).await,
        Err(CoreError::Validation(msg)) if msg.contains("maximum")
    );
    assert_matches!(
        h.services.ledger.allocate_cycle(tenant.id, cycle(100, Some(u64::MAX))).await,
        Err(CoreError::Validation(_))
    );
    assert_eq!(h.store.count(collections::TENANT_CREDITS).await, 0);

    assert_matches!(
        h.services.ledger.allocate_cycle(uuid::Uuid::now_v7(), cycle(100, None)).await,
        Err(CoreError::NotFound { entity: "Tenant", .. })
    );
}

#[tokio::test]
async fn zero_cost_is_a_validation_error() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    assert_matches!(
        h.services.ledger.authorize(tenant.id, 0).await,
        Err(CoreError::Validation(_))
    );
}

#[tokio::test]
async fn transactions_newest_first_and_reconcile() {
    let h = harness();
    let tenant = create_tenant(&h, "pinehollow").await;
    h.services.ledger.allocate_cycle(tenant.id, cycle(100, None)).await.unwrap();
    for cost in [10, 20, 30] {
        h.services.ledger.charge(tenant.id, cost, "article").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let txns = h.services.ledger.transactions(tenant.id, 10).await.unwrap();
    assert_eq!(txns.len(), 4);
    assert_eq!(txns[0].amount, 30);
    assert_eq!(txns.last().unwrap().transaction_type, TransactionType::Allocation);

    let limited = h.services.ledger.transactions(tenant.id, 2).await.unwrap();
    assert_eq!(limited.len(), 2);

    let report = h.services.ledger.reconcile(tenant.id).await.unwrap();
    assert_eq!(report.credits_used, 60);
    assert_eq!(report.debited_total, 60);
    assert_eq!(report.transaction_count, 4);
    assert!(report.balanced);
}
