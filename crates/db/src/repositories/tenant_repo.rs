//! Repository for the `tenants` collection, its slug claims and its
//! `categories` subcollection.

use serde_json::Value;

use newsdesk_core::types::TenantId;

use crate::error::StoreError;
use crate::models::tenant::{Category, SlugClaim, Tenant, TenantApiKey};
use crate::store::{collections, DocumentStore, Versioned, WriteBatch, MAX_BATCH_WRITES};

pub struct TenantRepo;

impl TenantRepo {
    /// Find a tenant by ID, with the version it was read at.
    pub async fn find_by_id(
        store: &dyn DocumentStore,
        id: TenantId,
    ) -> Result<Option<Versioned<Tenant>>, StoreError> {
        store
            .get(collections::TENANTS, &id.to_string())
            .await?
            .map(|doc| doc.decode_versioned())
            .transpose()
    }

    /// Find the tenant whose slug equals `slug` (slugs are stored lowercase).
    pub async fn find_by_slug(
        store: &dyn DocumentStore,
        slug: &str,
    ) -> Result<Option<Tenant>, StoreError> {
        let docs = store
            .query_eq(
                collections::TENANTS,
                "slug",
                &Value::String(slug.to_lowercase()),
                Some(1),
            )
            .await?;
        docs.first().map(|doc| doc.decode()).transpose()
    }

    /// The claim on a slug, if any tenant holds it.
    pub async fn find_slug_claim(
        store: &dyn DocumentStore,
        slug: &str,
    ) -> Result<Option<SlugClaim>, StoreError> {
        store
            .get(collections::TENANT_SLUGS, &slug.to_lowercase())
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// Insert the tenant, claim its slug, store its API key digest and
    /// denormalise its categories into the `categories` subcollection, all in
    /// one batch.
    ///
    /// Fails with `AlreadyExists` (and writes nothing) if the slug is claimed.
    pub async fn create(
        store: &dyn DocumentStore,
        tenant: &Tenant,
        claim: &SlugClaim,
        api_key: &TenantApiKey,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.create(collections::TENANT_SLUGS, tenant.slug.clone(), claim)?;
        batch.create(collections::TENANTS, tenant.id.to_string(), tenant)?;
        batch.set(collections::TENANT_API_KEYS, tenant.id.to_string(), api_key)?;
        let categories = collections::tenant_sub(tenant.id, collections::CATEGORIES);
        for category in &tenant.categories {
            batch.set(categories.clone(), category.slug.clone(), category)?;
        }
        store.commit(batch).await
    }

    /// Overwrite the tenant document if it is still at `expected_version`.
    pub async fn update(
        store: &dyn DocumentStore,
        tenant: &Tenant,
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.update(
            collections::TENANTS,
            tenant.id.to_string(),
            tenant,
            Some(expected_version),
        )?;
        store.commit(batch).await
    }

    pub async fn find_api_key(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
    ) -> Result<Option<TenantApiKey>, StoreError> {
        store
            .get(collections::TENANT_API_KEYS, &tenant_id.to_string())
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// Replace the key digest and the tenant's display prefix together, if
    /// the tenant is still at `expected_version`.
    pub async fn replace_api_key(
        store: &dyn DocumentStore,
        tenant: &Tenant,
        expected_version: i64,
        api_key: &TenantApiKey,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.update(
            collections::TENANTS,
            tenant.id.to_string(),
            tenant,
            Some(expected_version),
        )?;
        batch.set(collections::TENANT_API_KEYS, tenant.id.to_string(), api_key)?;
        store.commit(batch).await
    }

    /// Upsert categories keyed by slug. Safe to repeat.
    pub async fn upsert_categories(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
        categories: &[Category],
    ) -> Result<usize, StoreError> {
        let collection = collections::tenant_sub(tenant_id, collections::CATEGORIES);
        for chunk in categories.chunks(MAX_BATCH_WRITES) {
            let mut batch = WriteBatch::new();
            for category in chunk {
                batch.set(collection.clone(), category.slug.clone(), category)?;
            }
            store.commit(batch).await?;
        }
        Ok(categories.len())
    }

    /// Categories in the subcollection, ordered by slug.
    pub async fn list_categories(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
    ) -> Result<Vec<Category>, StoreError> {
        store
            .list(
                &collections::tenant_sub(tenant_id, collections::CATEGORIES),
                MAX_BATCH_WRITES,
            )
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Delete the tenant document and its key digest and release its slug in
    /// one batch. Every delete is a no-op when already gone.
    pub async fn delete(
        store: &dyn DocumentStore,
        tenant_id: TenantId,
        slug: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(collections::TENANTS, tenant_id.to_string());
        batch.delete(collections::TENANT_API_KEYS, tenant_id.to_string());
        if let Some(slug) = slug {
            batch.delete(collections::TENANT_SLUGS, slug.to_lowercase());
        }
        store.commit(batch).await
    }
}
