#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use newsdesk_api::config::ServerConfig;
use newsdesk_api::router::build_app_router;
use newsdesk_api::state::AppState;
use newsdesk_core::collaborators::{DomainRegistrar, EmailSender, OutgoingEmail};
use newsdesk_core::error::CoreError;
use newsdesk_db::{DocumentStore, MemoryDocumentStore};
use newsdesk_tenancy::Services;

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeRegistrar {
    pub fail: AtomicBool,
    pub added: Mutex<Vec<String>>,
}

#[async_trait]
impl DomainRegistrar for FakeRegistrar {
    fn is_configured(&self) -> bool {
        true
    }

    async fn add_domain(&self, _project_id: &str, domain: &str) -> Result<(), CoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Collaborator {
                collaborator: "domain_registrar",
                reason: "registrar unavailable".to_string(),
            });
        }
        self.added.lock().unwrap().push(domain.to_string());
        Ok(())
    }

    async fn project_domains(&self, _project_id: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.added.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send_email(&self, email: &OutgoingEmail) -> Result<String, CoreError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok("msg-1".to_string())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        platform_domain: "newsdesk.test".to_string(),
        ai_settings_ttl_secs: 300,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryDocumentStore>,
    pub registrar: Arc<FakeRegistrar>,
    pub email: Arc<RecordingEmail>,
}

impl TestApp {
    /// A fresh handle on the router; each request consumes one.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router over an in-memory store, with the
/// same middleware stack production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryDocumentStore::new());
    let registrar = Arc::new(FakeRegistrar::default());
    let email = Arc::new(RecordingEmail::default());

    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let services = Services::new(
        Arc::clone(&dyn_store),
        registrar.clone(),
        Some(email.clone() as Arc<dyn EmailSender>),
        config.tenancy(),
    );
    let state = AppState {
        store: dyn_store,
        services,
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        registrar,
        email,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    api_key: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn tenant_body(slug: &str) -> Value {
    json!({
        "businessName": "Pine Hollow Gazette",
        "slug": slug,
        "serviceArea": { "city": "Pine Hollow", "state": "OR" },
        "categories": [
            { "name": "Local News", "slug": "local-news" },
            { "name": "Sports", "slug": "sports" }
        ],
        "ownerEmail": "owner@pinehollow.test",
        "vercelProjectId": "prj_pine"
    })
}

/// Create a tenant and return its `data` object.
pub async fn create_tenant(app: &TestApp, slug: &str) -> Value {
    let response = post_json(app.app(), "/api/v1/tenants", tenant_body(slug)).await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"].clone()
}

/// Open a billing cycle covering now.
pub async fn allocate(app: &TestApp, tenant_id: &str, allocation: u64, hard_limit: u64) {
    let now = chrono::Utc::now();
    let response = post_json(
        app.app(),
        &format!("/api/v1/tenants/{tenant_id}/credits/cycles"),
        json!({
            "planId": "growth",
            "monthlyAllocation": allocation,
            "cycleStart": now - chrono::Duration::days(1),
            "cycleEnd": now + chrono::Duration::days(29),
            "hardLimit": hard_limit
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
}
