//! A single-value cache with a bounded time-to-live.
//!
//! Owned by exactly one service (e.g. the AI settings service), which calls
//! [`TtlCache::invalidate`] whenever it writes the underlying value.

use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

pub struct TtlCache<T> {
    ttl: Duration,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value, if present and younger than the TTL.
    pub async fn get(&self) -> Option<T> {
        let guard = self.entry.read().await;
        guard
            .as_ref()
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn put(&self, value: T) {
        *self.entry.write().await = Some(Entry {
            value,
            stored_at: Instant::now(),
        });
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }
}
