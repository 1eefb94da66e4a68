/// Tenants, ledger entries and transactions are keyed by UUID.
pub type TenantId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
