//! Document store error types and their mapping onto the domain taxonomy.

use newsdesk_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document encoding error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Batch of {len} writes exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Version conflict on {collection}/{id}")]
    VersionConflict { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("Document missing: {collection}/{id}")]
    Missing { collection: String, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict { .. } | StoreError::AlreadyExists { .. } => {
                CoreError::Conflict(err.to_string())
            }
            StoreError::Missing { collection, id } => CoreError::NotFound {
                entity: "Document",
                id: format!("{collection}/{id}"),
            },
            other => CoreError::Internal(other.to_string()),
        }
    }
}
