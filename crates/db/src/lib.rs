//! Persistence layer: the document store abstraction, its PostgreSQL and
//! in-memory implementations, document models and repositories.

mod error;
mod memory_store;
mod pg_store;
mod store;

pub mod models;
pub mod repositories;

pub use error::StoreError;
pub use memory_store::MemoryDocumentStore;
pub use pg_store::PgDocumentStore;
pub use store::{collections, Document, DocumentStore, Versioned, WriteBatch, WriteOp, MAX_BATCH_WRITES};

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
