//! Per-tenant critical sections.
//!
//! Debits on one tenant run one at a time; different tenants never wait on
//! each other. The ledger document's version check still guards against
//! writers in other processes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use newsdesk_core::types::TenantId;

/// Idle entries are swept once the map grows past this size.
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Default)]
pub struct TenantLocks {
    locks: Mutex<HashMap<TenantId, Arc<Mutex<()>>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `tenant_id`. Released when the guard drops.
    pub async fn lock(&self, tenant_id: TenantId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > SWEEP_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(tenant_id).or_default())
        };
        lock.lock_owned().await
    }
}
