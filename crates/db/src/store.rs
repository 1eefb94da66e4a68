//! The document store abstraction.
//!
//! Documents live at `(collection, id)`. Nested collections are addressed by
//! path (`tenants/{tenantId}/articles`). The store offers point reads,
//! equality queries on a top-level field, and atomic write batches; there is
//! no atomicity across batches.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use newsdesk_core::types::Timestamp;

use crate::error::StoreError;

/// Maximum number of writes a single batch may carry.
pub const MAX_BATCH_WRITES: usize = 500;

// ---------------------------------------------------------------------------
// Collection names
// ---------------------------------------------------------------------------

pub mod collections {
    use newsdesk_core::types::TenantId;

    pub const TENANTS: &str = "tenants";
    /// One document per slug in use, keyed by the slug. Created in the same
    /// batch as the tenant so two tenants can never claim one slug.
    pub const TENANT_SLUGS: &str = "tenantSlugs";
    /// Digest of each tenant's API key, keyed by tenant id.
    pub const TENANT_API_KEYS: &str = "tenantApiKeys";
    pub const AI_JOURNALISTS: &str = "aiJournalists";
    pub const TENANT_CREDITS: &str = "tenantCredits";
    pub const CREDIT_TRANSACTIONS: &str = "creditTransactions";
    pub const ONBOARDING_PROGRESS: &str = "onboardingProgress";
    pub const ONBOARDING_SESSIONS: &str = "onboardingSessions";
    pub const SETTINGS: &str = "settings";

    pub const ARTICLES: &str = "articles";
    pub const CATEGORIES: &str = "categories";
    pub const META: &str = "meta";
    pub const USERS: &str = "users";
    pub const MENUS: &str = "menus";

    /// Every collection nested under a tenant document.
    pub const TENANT_SUBCOLLECTIONS: [&str; 5] = [ARTICLES, CATEGORIES, META, USERS, MENUS];

    /// Path of a collection nested under a tenant.
    pub fn tenant_sub(tenant_id: TenantId, name: &str) -> String {
        format!("{TENANTS}/{tenant_id}/{name}")
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: String,
    pub id: String,
    pub data: Value,
    /// 1 on creation, incremented on every write.
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    pub fn decode_versioned<T: DeserializeOwned>(&self) -> Result<Versioned<T>, StoreError> {
        Ok(Versioned {
            value: self.decode()?,
            version: self.version,
        })
    }
}

/// A decoded document together with the version it was read at, for
/// compare-and-swap writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: i64,
}

// ---------------------------------------------------------------------------
// Write batches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert; fails with `AlreadyExists` if the document is present.
    Create {
        collection: String,
        id: String,
        data: Value,
    },
    /// Upsert with full overwrite.
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    /// Overwrite an existing document; with `expected_version`, only if the
    /// stored version still matches.
    Update {
        collection: String,
        id: String,
        data: Value,
        expected_version: Option<i64>,
    },
    /// Remove; deleting an absent document is not an error.
    Delete { collection: String, id: String },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            Self::Create { collection, .. }
            | Self::Set { collection, .. }
            | Self::Update { collection, .. }
            | Self::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Create { id, .. }
            | Self::Set { id, .. }
            | Self::Update { id, .. }
            | Self::Delete { id, .. } => id,
        }
    }
}

/// An ordered group of writes committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<T: Serialize>(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self, StoreError> {
        self.ops.push(WriteOp::Create {
            collection: collection.into(),
            id: id.into(),
            data: serde_json::to_value(value)?,
        });
        Ok(self)
    }

    pub fn set<T: Serialize>(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self, StoreError> {
        self.ops.push(WriteOp::Set {
            collection: collection.into(),
            id: id.into(),
            data: serde_json::to_value(value)?,
        });
        Ok(self)
    }

    pub fn update<T: Serialize>(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        value: &T,
        expected_version: Option<i64>,
    ) -> Result<&mut Self, StoreError> {
        self.ops.push(WriteOp::Update {
            collection: collection.into(),
            id: id.into(),
            data: serde_json::to_value(value)?,
            expected_version,
        });
        Ok(self)
    }

    pub fn delete(&mut self, collection: impl Into<String>, id: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.into(),
            id: id.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Reject batches the store would refuse, before any write happens.
    pub fn check_size(&self) -> Result<(), StoreError> {
        if self.ops.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge {
                len: self.ops.len(),
                max: MAX_BATCH_WRITES,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Documents whose top-level `field` equals `value`, ordered by id.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Up to `limit` documents of a collection, ordered by id.
    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<Document>, StoreError>;

    /// Apply every write in the batch, or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
