use crate::types::TenantId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The credit ledger denied a paid operation. Kept distinct from
    /// `Validation` so callers can route to an upgrade or overage flow.
    #[error("Insufficient credits for tenant {tenant_id}: requested {requested}, available {available:?}")]
    InsufficientCredits {
        tenant_id: TenantId,
        requested: u64,
        /// `None` when the tenant has no active ledger entry at all.
        available: Option<u64>,
    },

    #[error("{collaborator} call failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },

    #[error("Cascade delete of tenant {tenant_id} stopped at '{failed_step}': {reason}")]
    PartialCascade {
        tenant_id: TenantId,
        completed: Vec<String>,
        failed_step: String,
        reason: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short, stable name of the error kind, attached to logs and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::InsufficientCredits { .. } => "insufficient_credits",
            Self::Collaborator { .. } => "collaborator_failure",
            Self::PartialCascade { .. } => "partial_cascade",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether repeating the whole operation unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Collaborator { .. } | Self::PartialCascade { .. })
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
