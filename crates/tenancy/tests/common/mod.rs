//! Shared harness for tenancy integration tests: an in-memory store and
//! fake collaborators.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use newsdesk_core::collaborators::{DomainRegistrar, EmailSender, OutgoingEmail};
use newsdesk_core::error::CoreError;
use newsdesk_db::models::credit::AllocateCycle;
use newsdesk_db::models::tenant::{CategoryInput, CreateTenant, CreatedTenant, ServiceArea, Tenant};
use newsdesk_db::MemoryDocumentStore;
use newsdesk_tenancy::{Services, TenancyConfig};

#[derive(Default)]
pub struct FakeRegistrar {
    pub unconfigured: AtomicBool,
    pub fail: AtomicBool,
    pub added: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl DomainRegistrar for FakeRegistrar {
    fn is_configured(&self) -> bool {
        !self.unconfigured.load(Ordering::SeqCst)
    }

    async fn add_domain(&self, project_id: &str, domain: &str) -> Result<(), CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Collaborator {
                collaborator: "domain_registrar",
                reason: "registrar returned 500".to_string(),
            });
        }
        self.added
            .lock()
            .unwrap()
            .push((project_id.to_string(), domain.to_string()));
        Ok(())
    }

    async fn project_domains(&self, _project_id: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.added.lock().unwrap().iter().map(|(_, d)| d.clone()).collect())
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    pub fail: AtomicBool,
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingEmail {
    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.subject.clone()).collect()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send_email(&self, email: &OutgoingEmail) -> Result<String, CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Collaborator {
                collaborator: "email",
                reason: "smtp down".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

pub struct Harness {
    pub store: Arc<MemoryDocumentStore>,
    pub registrar: Arc<FakeRegistrar>,
    pub email: Arc<RecordingEmail>,
    pub services: Services,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryDocumentStore::new());
    let registrar = Arc::new(FakeRegistrar::default());
    let email = Arc::new(RecordingEmail::default());
    let services = Services::new(
        store.clone(),
        registrar.clone(),
        Some(email.clone() as Arc<dyn EmailSender>),
        TenancyConfig::default(),
    );
    Harness {
        store,
        registrar,
        email,
        services,
    }
}

pub fn service_area() -> ServiceArea {
    ServiceArea {
        city: "Pine Hollow".to_string(),
        state: "OR".to_string(),
        region: None,
        county: Some("Lane".to_string()),
    }
}

pub fn category(name: &str, slug: &str) -> CategoryInput {
    CategoryInput {
        id: None,
        name: name.to_string(),
        slug: Some(slug.to_string()),
        directive: Some(format!("Cover {name} in Pine Hollow")),
        enabled: None,
    }
}

pub fn create_input(slug: &str) -> CreateTenant {
    CreateTenant {
        business_name: "Pine Hollow Gazette".to_string(),
        slug: slug.to_string(),
        service_area: service_area(),
        categories: vec![category("Local News", "local-news"), category("Sports", "sports")],
        owner_email: Some("owner@pinehollow.test".to_string()),
        licensing_status: None,
        stripe_customer_id: Some("cus_123".to_string()),
        stripe_subscription_id: None,
        vercel_project_id: Some("prj_pine".to_string()),
    }
}

pub async fn create_tenant(h: &Harness, slug: &str) -> Tenant {
    create_tenant_with_key(h, slug).await.tenant
}

pub async fn create_tenant_with_key(h: &Harness, slug: &str) -> CreatedTenant {
    h.services
        .lifecycle
        .create_tenant(create_input(slug))
        .await
        .expect("tenant should be created")
}

/// A cycle covering now.
pub fn cycle(monthly_allocation: u64, hard_limit: Option<u64>) -> AllocateCycle {
    let now = Utc::now();
    AllocateCycle {
        plan_id: "growth".to_string(),
        monthly_allocation,
        cycle_start: now - Duration::days(1),
        cycle_end: now + Duration::days(29),
        soft_limit: None,
        hard_limit,
    }
}
