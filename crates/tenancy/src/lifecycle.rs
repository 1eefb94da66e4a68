//! Tenant lifecycle management.
//!
//! The only component that changes a tenant's status. It creates tenants
//! (claiming the slug and denormalising categories in one batch), drives
//! `provisioning -> seeding -> active`, applies billing-driven suspension,
//! reviews custom-domain requests, and runs the cascading delete.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use newsdesk_core::collaborators::DomainRegistrar;
use newsdesk_core::error::CoreError;
use newsdesk_core::onboarding::{can_provision, DomainOption, OnboardingStatus};
use newsdesk_core::setup_progress::SetupStep;
use newsdesk_core::slug::{
    subdomain_for, suggest_slug, validate_category_slug, validate_slug, validate_slug_format,
    SlugAvailability,
};
use newsdesk_core::tenant::{
    can_review_domain_request, can_submit_domain_request, normalize_domain, status_for_licensing,
    validate_status_transition, DomainRequestStatus, LicensingStatus, TenantStatus,
};
use newsdesk_core::tokens::{generate_api_key, hash_api_key, GeneratedApiKey};
use newsdesk_core::types::TenantId;
use newsdesk_db::models::journalist::AiJournalist;
use newsdesk_db::models::onboarding_session::OnboardingSession;
use newsdesk_db::models::tenant::{
    Category, CategoryInput, CreateTenant, CreatedTenant, DeletionReport, DomainRequest,
    RecordDeployment, SlugClaim, Tenant, TenantApiKey, UpdateLicensing,
};
use newsdesk_db::repositories::{CascadeRepo, JournalistRepo, SetupProgressRepo, TenantRepo};
use newsdesk_db::{collections, DocumentStore, StoreError, Versioned};

use crate::notify::{self, Notifier};
use crate::onboarding::OnboardingStore;
use crate::progress::SetupTracker;
use crate::settings::AiSettingsService;
use crate::validate_input;

#[derive(Clone)]
pub struct TenantLifecycle {
    store: Arc<dyn DocumentStore>,
    registrar: Arc<dyn DomainRegistrar>,
    notifier: Notifier,
    progress: SetupTracker,
    sessions: OnboardingStore,
    settings: AiSettingsService,
    platform_domain: String,
}

impl TenantLifecycle {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registrar: Arc<dyn DomainRegistrar>,
        notifier: Notifier,
        progress: SetupTracker,
        sessions: OnboardingStore,
        settings: AiSettingsService,
        platform_domain: String,
    ) -> Self {
        Self {
            store,
            registrar,
            notifier,
            progress,
            sessions,
            settings,
            platform_domain,
        }
    }

    pub fn platform_domain(&self) -> &str {
        &self.platform_domain
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_tenant(&self, tenant_id: TenantId) -> Result<Tenant, CoreError> {
        Ok(self.load(tenant_id).await?.value)
    }

    /// Format, reserved-word and uniqueness check for a prospective slug.
    pub async fn check_slug(&self, slug: &str) -> Result<SlugAvailability, CoreError> {
        let slug = slug.trim();
        let taken = if validate_slug(slug).is_ok() {
            TenantRepo::find_slug_claim(self.store.as_ref(), slug)
                .await?
                .is_some()
        } else {
            false
        };
        Ok(SlugAvailability::evaluate(slug, taken, &self.platform_domain))
    }

    /// Reject anything but the tenant's own API key.
    pub async fn verify_api_key(&self, tenant_id: TenantId, api_key: &str) -> Result<(), CoreError> {
        let stored = TenantRepo::find_api_key(self.store.as_ref(), tenant_id).await?;
        match stored {
            Some(key) if key.key_hash == hash_api_key(api_key) => Ok(()),
            _ => {
                tracing::warn!(%tenant_id, "Rejected tenant API key");
                Err(CoreError::Unauthorized("Invalid API key".to_string()))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a tenant in `provisioning` with its slug claimed, categories
    /// denormalised by slug, and setup progress initialised. The returned
    /// API key is not stored anywhere and cannot be shown again.
    pub async fn create_tenant(&self, input: CreateTenant) -> Result<CreatedTenant, CoreError> {
        self.create_with_id(Uuid::now_v7(), input).await
    }

    async fn create_with_id(
        &self,
        tenant_id: TenantId,
        input: CreateTenant,
    ) -> Result<CreatedTenant, CoreError> {
        validate_input(&input)?;
        let slug = input.slug.trim().to_string();
        validate_slug(&slug)?;
        let categories = build_categories(&input.categories)?;

        let now = Utc::now();
        let key = generate_api_key();
        let tenant = Tenant {
            id: tenant_id,
            business_name: input.business_name.trim().to_string(),
            domain: subdomain_for(&slug, &self.platform_domain),
            slug,
            custom_domain: None,
            service_area: input.service_area,
            categories,
            status: TenantStatus::Provisioning,
            licensing_status: input.licensing_status.unwrap_or(LicensingStatus::Trial),
            domain_request: None,
            owner_email: input.owner_email,
            stripe_customer_id: input.stripe_customer_id,
            stripe_subscription_id: input.stripe_subscription_id,
            vercel_project_id: input.vercel_project_id,
            site_url: None,
            api_key_prefix: key.prefix.clone(),
            created_at: now,
            updated_at: now,
        };
        let claim = SlugClaim {
            tenant_id,
            claimed_at: now,
        };

        match TenantRepo::create(self.store.as_ref(), &tenant, &claim, &key_record(tenant_id, &key))
            .await
        {
            Ok(()) => {}
            Err(StoreError::AlreadyExists { collection, .. })
                if collection == collections::TENANT_SLUGS =>
            {
                return Err(CoreError::Conflict(format!(
                    "Slug '{}' is already in use",
                    tenant.slug
                )));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(%tenant_id, slug = %tenant.slug, "Tenant created");

        self.initialize_progress(&tenant).await?;
        Ok(CreatedTenant {
            tenant,
            api_key: key.plaintext,
        })
    }

    /// Issue a new API key, invalidating the previous one.
    pub async fn rotate_api_key(&self, tenant_id: TenantId) -> Result<CreatedTenant, CoreError> {
        let Versioned { value: mut tenant, version } = self.load(tenant_id).await?;
        let key = generate_api_key();
        tenant.api_key_prefix = key.prefix.clone();
        tenant.updated_at = Utc::now();
        TenantRepo::replace_api_key(self.store.as_ref(), &tenant, version, &key_record(tenant_id, &key))
            .await?;
        tracing::info!(%tenant_id, prefix = %key.prefix, "Tenant API key rotated");
        Ok(CreatedTenant {
            tenant,
            api_key: key.plaintext,
        })
    }

    /// Turn a finished onboarding session into a tenant.
    ///
    /// The session goes `in_progress -> seeding -> complete`. The tenant id
    /// is written to the session before the tenant is created, so a run that
    /// dies halfway can be repeated: the rerun finds its own tenant, finishes
    /// the remaining steps and issues a fresh API key, since the first one
    /// never reached the owner. If the tenant could not be created at all the
    /// session is put back to `in_progress` so the owner can fix the
    /// offending field. Every session write is checked against the version
    /// read, so of two concurrent runs only one proceeds.
    pub async fn provision_from_session(&self, resume_token: &str) -> Result<CreatedTenant, CoreError> {
        let current = self.sessions.load_versioned(resume_token).await?;
        can_provision(current.value.current_step, current.value.status)?;
        let input = tenant_input_from_session(&current.value)?;
        let custom_domain = match current.value.domain_option {
            Some(DomainOption::CustomDomain) => current
                .value
                .domain
                .as_deref()
                .map(normalize_domain)
                .transpose()?,
            _ => None,
        };

        let tenant_id = current.value.tenant_id.unwrap_or_else(Uuid::now_v7);
        let mut session = current.value;
        session.status = OnboardingStatus::Seeding;
        session.tenant_id = Some(tenant_id);
        let seeding = self.sessions.replace(session, current.version).await?;

        let created = match TenantRepo::find_by_id(self.store.as_ref(), tenant_id).await? {
            Some(existing) => {
                tracing::info!(%tenant_id, "Resuming interrupted provisioning");
                self.initialize_progress(&existing.value).await?;
                self.rotate_api_key(tenant_id).await?
            }
            None => match self.create_with_id(tenant_id, input).await {
                Ok(created) => created,
                Err(e) => return Err(self.abandon_provisioning(seeding, tenant_id, e).await),
            },
        };

        let mut tenant = created.tenant;
        if let Some(domain) = custom_domain {
            if tenant.domain_request.is_none() {
                tenant = self.request_domain(tenant_id, &domain).await?;
            }
        }

        let mut session = seeding.value;
        session.status = OnboardingStatus::Complete;
        self.sessions.replace(session, seeding.version).await?;
        tracing::info!(%tenant_id, "Tenant provisioned from onboarding session");
        Ok(CreatedTenant {
            tenant,
            api_key: created.api_key,
        })
    }

    /// Reopen the session unless the tenant got written, in which case it
    /// stays in `seeding` for a rerun to finish.
    async fn abandon_provisioning(
        &self,
        seeding: Versioned<OnboardingSession>,
        tenant_id: TenantId,
        err: CoreError,
    ) -> CoreError {
        tracing::warn!(%tenant_id, error = %err, "Provisioning from onboarding session failed");
        match TenantRepo::find_by_id(self.store.as_ref(), tenant_id).await {
            Ok(None) => {
                let mut session = seeding.value;
                session.status = OnboardingStatus::InProgress;
                if let Err(revert) = self.sessions.replace(session, seeding.version).await {
                    tracing::error!(error = %revert, "Could not reopen onboarding session");
                }
            }
            Ok(Some(_)) => {
                tracing::info!(%tenant_id, "Tenant already written, session left for a rerun");
            }
            Err(e) => {
                tracing::warn!(%tenant_id, error = %e, "Could not check for a partially provisioned tenant");
            }
        }
        err
    }

    /// Idempotent: an existing progress record is left as it is.
    async fn initialize_progress(&self, tenant: &Tenant) -> Result<(), CoreError> {
        let per_category = self.settings.get().await?.articles_per_category;
        let targets: Vec<(String, u32)> = tenant
            .categories
            .iter()
            .filter(|c| c.enabled)
            .map(|c| (c.slug.clone(), per_category))
            .collect();
        self.progress.initialize(tenant.id, &targets).await?;
        Ok(())
    }

    /// Record the hosting project and URL the site was deployed to.
    pub async fn record_deployment(
        &self,
        tenant_id: TenantId,
        input: RecordDeployment,
    ) -> Result<Tenant, CoreError> {
        validate_input(&input)?;
        let tenant = self
            .transition(tenant_id, |tenant| {
                tenant.vercel_project_id = Some(input.vercel_project_id.clone());
                // An approved custom domain stays the public URL.
                if tenant.custom_domain.is_none() {
                    tenant.site_url = Some(input.site_url.clone());
                }
                Ok(())
            })
            .await?;
        self.progress.advance(tenant_id, SetupStep::SiteDeployed).await?;
        tracing::info!(
            %tenant_id,
            project_id = %input.vercel_project_id,
            site_url = %input.site_url,
            "Site deployment recorded"
        );
        Ok(tenant)
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Seed categories and journalists, then move to `seeding`.
    ///
    /// Every write is an upsert keyed by slug, so re-running on a tenant
    /// already in `seeding` finishes an interrupted seed.
    pub async fn begin_seeding(&self, tenant_id: TenantId) -> Result<Tenant, CoreError> {
        let Versioned { value: mut tenant, version } = self.load(tenant_id).await?;
        if tenant.status != TenantStatus::Seeding {
            validate_status_transition(tenant.status, TenantStatus::Seeding)?;
        }

        let seeded =
            TenantRepo::upsert_categories(self.store.as_ref(), tenant_id, &tenant.categories).await?;
        self.progress.advance(tenant_id, SetupStep::CategoriesSeeded).await?;

        let now = Utc::now();
        let journalists: Vec<AiJournalist> = tenant
            .categories
            .iter()
            .filter(|c| c.enabled)
            .map(|c| AiJournalist {
                id: AiJournalist::document_id(tenant_id, &c.slug),
                tenant_id,
                name: format!("{} Desk", c.name),
                category_slug: c.slug.clone(),
                beat: c.directive.clone(),
                active: true,
                created_at: now,
            })
            .collect();
        let hired = JournalistRepo::upsert_many(self.store.as_ref(), &journalists).await?;
        self.progress.advance(tenant_id, SetupStep::JournalistsSeeded).await?;

        if tenant.status != TenantStatus::Seeding {
            tenant.status = TenantStatus::Seeding;
            tenant.updated_at = now;
            TenantRepo::update(self.store.as_ref(), &tenant, version).await?;
        }
        tracing::info!(%tenant_id, categories = seeded, journalists = hired, "Tenant seeded");
        Ok(tenant)
    }

    pub async fn activate(&self, tenant_id: TenantId) -> Result<Tenant, CoreError> {
        let tenant = self
            .transition(tenant_id, |tenant| {
                validate_status_transition(tenant.status, TenantStatus::Active)?;
                tenant.status = TenantStatus::Active;
                Ok(())
            })
            .await?;
        self.progress.advance(tenant_id, SetupStep::Complete).await?;
        tracing::info!(%tenant_id, "Tenant activated");
        Ok(tenant)
    }

    /// Record a licensing change from billing, suspending or reinstating an
    /// active tenant as the new licence dictates.
    pub async fn apply_licensing_status(
        &self,
        tenant_id: TenantId,
        update: UpdateLicensing,
    ) -> Result<Tenant, CoreError> {
        let tenant = self
            .transition(tenant_id, |tenant| {
                tenant.licensing_status = update.licensing_status;
                if let Some(subscription) = &update.stripe_subscription_id {
                    tenant.stripe_subscription_id = Some(subscription.clone());
                }
                if let Some(next) = status_for_licensing(tenant.status, update.licensing_status) {
                    validate_status_transition(tenant.status, next)?;
                    tenant.status = next;
                }
                Ok(())
            })
            .await?;
        tracing::info!(
            %tenant_id,
            licensing_status = tenant.licensing_status.as_str(),
            status = tenant.status.as_str(),
            "Licensing status applied"
        );
        Ok(tenant)
    }

    // -----------------------------------------------------------------------
    // Domain requests
    // -----------------------------------------------------------------------

    pub async fn request_domain(&self, tenant_id: TenantId, domain: &str) -> Result<Tenant, CoreError> {
        let domain = normalize_domain(domain)?;
        let tenant = self
            .transition(tenant_id, |tenant| {
                can_submit_domain_request(tenant.domain_request_status())?;
                tenant.domain_request = Some(DomainRequest {
                    domain: domain.clone(),
                    status: DomainRequestStatus::Pending,
                    requested_at: Utc::now(),
                    reviewed_at: None,
                    rejection_reason: None,
                });
                Ok(())
            })
            .await?;
        tracing::info!(%tenant_id, %domain, "Domain request submitted");
        Ok(tenant)
    }

    /// Register the requested domain, and only then mark it approved. A
    /// domain the hosting project already carries counts as registered, so
    /// an approval whose final write failed can simply be repeated.
    pub async fn approve_domain(&self, tenant_id: TenantId) -> Result<Tenant, CoreError> {
        let Versioned { value: mut tenant, version } = self.load(tenant_id).await?;
        can_review_domain_request(tenant.domain_request_status())?;
        let Some(mut request) = tenant.domain_request.clone() else {
            return Err(CoreError::Conflict("Tenant has no domain request to review".to_string()));
        };
        let project_id = tenant.vercel_project_id.clone().ok_or_else(|| {
            CoreError::Conflict("Tenant has no hosting project to attach a domain to".to_string())
        })?;

        if !self.registrar.is_configured() {
            return Err(CoreError::Collaborator {
                collaborator: "domain_registrar",
                reason: "not configured".to_string(),
            });
        }
        if let Err(e) = self.register_domain(&project_id, &request.domain).await {
            tracing::warn!(%tenant_id, domain = %request.domain, error = %e, "Domain registration failed, request left pending");
            return Err(e);
        }

        let now = Utc::now();
        request.status = DomainRequestStatus::Approved;
        request.reviewed_at = Some(now);
        tenant.custom_domain = Some(request.domain.clone());
        tenant.site_url = Some(format!("https://{}", request.domain));
        tenant.domain_request = Some(request.clone());
        tenant.updated_at = now;
        TenantRepo::update(self.store.as_ref(), &tenant, version).await?;

        tracing::info!(%tenant_id, domain = %request.domain, "Domain request approved");
        let (subject, body) = notify::domain_approved(&tenant, &request.domain);
        self.notifier.send_to_owner(&tenant, subject, body).await;
        Ok(tenant)
    }

    pub async fn reject_domain(&self, tenant_id: TenantId, reason: &str) -> Result<Tenant, CoreError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::Validation("A rejection reason is required".to_string()));
        }
        let tenant = self
            .transition(tenant_id, |tenant| {
                can_review_domain_request(tenant.domain_request_status())?;
                if let Some(request) = tenant.domain_request.as_mut() {
                    request.status = DomainRequestStatus::Rejected;
                    request.reviewed_at = Some(Utc::now());
                    request.rejection_reason = Some(reason.to_string());
                }
                Ok(())
            })
            .await?;

        if let Some(request) = &tenant.domain_request {
            tracing::info!(%tenant_id, domain = %request.domain, "Domain request rejected");
            let (subject, body) = notify::domain_rejected(&tenant, &request.domain, reason);
            self.notifier.send_to_owner(&tenant, subject, body).await;
        }
        Ok(tenant)
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Delete a tenant and everything under it.
    ///
    /// Children go first, page by page, then the progress record, then the
    /// tenant document together with its slug claim. Every step only removes
    /// what is still there, so a failed run can simply be repeated, and a
    /// tenant that does not exist is a successful no-op. Credit ledgers and
    /// transactions are kept for audit.
    pub async fn delete_tenant(&self, tenant_id: TenantId) -> Result<DeletionReport, CoreError> {
        let existing = TenantRepo::find_by_id(self.store.as_ref(), tenant_id).await?;
        let slug = existing.as_ref().map(|t| t.value.slug.clone());
        let mut report = DeletionReport {
            tenant_id,
            tenant_document_found: existing.is_some(),
            deleted: BTreeMap::new(),
        };
        let mut completed: Vec<String> = Vec::new();

        let fail = |completed: &[String], step: &str, err: StoreError| {
            tracing::error!(%tenant_id, step, error = %err, "Cascade delete stopped");
            CoreError::PartialCascade {
                tenant_id,
                completed: completed.to_vec(),
                failed_step: step.to_string(),
                reason: err.to_string(),
            }
        };

        for name in collections::TENANT_SUBCOLLECTIONS {
            let path = collections::tenant_sub(tenant_id, name);
            let mut removed = 0;
            loop {
                let page = CascadeRepo::delete_page(self.store.as_ref(), &path)
                    .await
                    .map_err(|e| fail(&completed, name, e))?;
                if page == 0 {
                    break;
                }
                removed += page;
            }
            tracing::debug!(%tenant_id, collection = name, removed, "Cascade step done");
            report.deleted.insert(name.to_string(), removed);
            completed.push(name.to_string());
        }

        let owner = Value::String(tenant_id.to_string());
        let mut removed = 0;
        loop {
            let page = CascadeRepo::delete_matching_page(
                self.store.as_ref(),
                collections::AI_JOURNALISTS,
                "tenantId",
                &owner,
            )
            .await
            .map_err(|e| fail(&completed, collections::AI_JOURNALISTS, e))?;
            if page == 0 {
                break;
            }
            removed += page;
        }
        report
            .deleted
            .insert(collections::AI_JOURNALISTS.to_string(), removed);
        completed.push(collections::AI_JOURNALISTS.to_string());

        SetupProgressRepo::delete(self.store.as_ref(), tenant_id)
            .await
            .map_err(|e| fail(&completed, collections::ONBOARDING_PROGRESS, e))?;
        completed.push(collections::ONBOARDING_PROGRESS.to_string());

        TenantRepo::delete(self.store.as_ref(), tenant_id, slug.as_deref())
            .await
            .map_err(|e| fail(&completed, collections::TENANTS, e))?;
        report
            .deleted
            .insert(collections::TENANTS.to_string(), usize::from(existing.is_some()));

        tracing::info!(
            %tenant_id,
            found = report.tenant_document_found,
            total = report.total_deleted(),
            "Tenant deleted"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn register_domain(&self, project_id: &str, domain: &str) -> Result<(), CoreError> {
        let attached = self.registrar.project_domains(project_id).await?;
        if attached.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
            tracing::info!(project_id, domain, "Domain already attached to hosting project");
            return Ok(());
        }
        self.registrar.add_domain(project_id, domain).await
    }

    async fn load(&self, tenant_id: TenantId) -> Result<Versioned<Tenant>, CoreError> {
        TenantRepo::find_by_id(self.store.as_ref(), tenant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Tenant", tenant_id))
    }

    /// Read the tenant, apply `change`, and write it back at the version read.
    async fn transition<F>(&self, tenant_id: TenantId, change: F) -> Result<Tenant, CoreError>
    where
        F: FnOnce(&mut Tenant) -> Result<(), CoreError>,
    {
        let Versioned { value: mut tenant, version } = self.load(tenant_id).await?;
        change(&mut tenant)?;
        tenant.updated_at = Utc::now();
        TenantRepo::update(self.store.as_ref(), &tenant, version).await?;
        Ok(tenant)
    }
}

fn key_record(tenant_id: TenantId, key: &GeneratedApiKey) -> TenantApiKey {
    TenantApiKey {
        tenant_id,
        key_hash: key.hash.clone(),
        key_prefix: key.prefix.clone(),
        created_at: Utc::now(),
    }
}

/// Resolve category inputs into stored categories, keyed by a required slug.
fn build_categories(inputs: &[CategoryInput]) -> Result<Vec<Category>, CoreError> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let slug = validate_category_slug(input.slug.as_deref(), &input.name)?;
            if !seen.insert(slug.clone()) {
                return Err(CoreError::Validation(format!(
                    "Category slug '{slug}' appears more than once"
                )));
            }
            Ok(Category {
                id: input.id.clone().unwrap_or_else(|| slug.clone()),
                name: input.name.trim().to_string(),
                directive: input.directive.clone().unwrap_or_default(),
                enabled: input.enabled.unwrap_or(true),
                slug,
            })
        })
        .collect()
}

/// Copy the wizard fields into a creation request.
fn tenant_input_from_session(session: &OnboardingSession) -> Result<CreateTenant, CoreError> {
    let missing = |field: &str| CoreError::Validation(format!("Onboarding session is missing {field}"));

    let business_name = session
        .newspaper_name
        .clone()
        .ok_or_else(|| missing("newspaperName"))?;
    let service_area = session
        .service_area
        .clone()
        .ok_or_else(|| missing("serviceArea"))?;
    let slug = match session.domain_option {
        Some(DomainOption::Subdomain) => {
            let requested = session.domain.clone().ok_or_else(|| missing("domain"))?;
            // Accept either a bare slug or the full platform subdomain.
            requested
                .split('.')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase()
        }
        Some(DomainOption::CustomDomain) | None => suggest_slug(&business_name),
    };
    validate_slug_format(&slug)?;

    Ok(CreateTenant {
        business_name,
        slug,
        service_area,
        categories: session.selected_categories.clone(),
        owner_email: session.owner_email.clone(),
        licensing_status: None,
        stripe_customer_id: None,
        stripe_subscription_id: None,
        vercel_project_id: None,
    })
}
