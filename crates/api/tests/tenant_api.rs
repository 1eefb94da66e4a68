//! HTTP-level tests for tenant lifecycle endpoints.

mod common;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use serde_json::json;

use common::{body_json, create_tenant, delete, get, post_json, put_json, tenant_body};
use newsdesk_db::collections;

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slug_availability_reflects_existing_tenants() {
    let app = common::build_test_app();

    let json = body_json(get(app.app(), "/api/v1/slugs/pinehollow/availability").await).await;
    assert_eq!(json["data"]["available"], true);
    assert_eq!(json["data"]["suggestedSubdomain"], "pinehollow.newsdesk.test");

    create_tenant(&app, "pinehollow").await;

    let json = body_json(get(app.app(), "/api/v1/slugs/pinehollow/availability").await).await;
    assert_eq!(json["data"]["available"], false);
    assert_eq!(json["data"]["rejection"], "taken");
}

#[tokio::test]
async fn reserved_slug_is_not_available() {
    let app = common::build_test_app();
    let json = body_json(get(app.app(), "/api/v1/slugs/admin/availability").await).await;
    assert_eq!(json["data"]["available"], false);
    assert_eq!(json["data"]["rejection"], "reserved");
}

// ---------------------------------------------------------------------------
// Create / get
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_tenant_returns_201_in_provisioning() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;

    assert_eq!(tenant["slug"], "pinehollow");
    assert_eq!(tenant["status"], "provisioning");
    assert_eq!(tenant["domain"], "pinehollow.newsdesk.test");
    assert!(tenant["apiKey"].as_str().is_some_and(|k| !k.is_empty()));

    let id = tenant["id"].as_str().unwrap();
    let response = get(app.app(), &format!("/api/v1/tenants/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["data"]["businessName"], "Pine Hollow Gazette");
    // The key is shown once, at creation; reads only carry its prefix.
    assert!(fetched["data"].get("apiKey").is_none());
    let key = tenant["apiKey"].as_str().unwrap();
    let prefix = fetched["data"]["apiKeyPrefix"].as_str().unwrap();
    assert!(key.starts_with(prefix));
}

#[tokio::test]
async fn rotating_the_api_key_returns_a_new_one() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();

    let response = post_json(app.app(), &format!("/api/v1/tenants/{id}/api-key"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rotated = json["data"]["apiKey"].as_str().unwrap();
    assert_ne!(rotated, tenant["apiKey"].as_str().unwrap());
    assert!(rotated.starts_with(json["data"]["apiKeyPrefix"].as_str().unwrap()));
}

#[tokio::test]
async fn deployment_is_validated_and_recorded() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();
    let uri = format!("/api/v1/tenants/{id}/deployment");

    let response = put_json(
        app.app(),
        &uri,
        json!({ "vercelProjectId": "prj_pine", "siteUrl": "nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json(
        app.app(),
        &uri,
        json!({ "vercelProjectId": "prj_pine", "siteUrl": "https://pinehollow.vercel.app" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["siteUrl"], "https://pinehollow.vercel.app");

    let progress = body_json(get(app.app(), &format!("/api/v1/tenants/{id}/progress")).await).await;
    assert_eq!(progress["data"]["currentStep"], "site_deployed");
}

#[tokio::test]
async fn duplicate_slug_returns_409() {
    let app = common::build_test_app();
    create_tenant(&app, "pinehollow").await;

    let response = post_json(app.app(), "/api/v1/tenants", tenant_body("pinehollow")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn invalid_slug_returns_400_and_writes_nothing() {
    let app = common::build_test_app();
    let response = post_json(app.app(), "/api/v1/tenants", tenant_body("No Spaces!")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(app.store.count(collections::TENANTS).await, 0);
}

#[tokio::test]
async fn unknown_tenant_returns_404() {
    let app = common::build_test_app();
    let response = get(
        app.app(),
        "/api/v1/tenants/01890000-0000-7000-8000-000000000000",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Seeding, activation, licensing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seed_then_activate() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();

    let response = post_json(app.app(), &format!("/api/v1/tenants/{id}/seed"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "seeding");

    let response = post_json(app.app(), &format!("/api/v1/tenants/{id}/activate"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "active");

    // Activating again is not a valid transition.
    let response = post_json(app.app(), &format!("/api/v1/tenants/{id}/activate"), json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelled_licence_suspends_an_active_tenant() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();
    post_json(app.app(), &format!("/api/v1/tenants/{id}/seed"), json!({})).await;
    post_json(app.app(), &format!("/api/v1/tenants/{id}/activate"), json!({})).await;

    let response = put_json(
        app.app(),
        &format!("/api/v1/tenants/{id}/licensing"),
        json!({ "licensingStatus": "canceled" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["licensingStatus"], "canceled");
    assert_eq!(json["data"]["status"], "suspended");
}

// ---------------------------------------------------------------------------
// Custom domains
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approve_domain_registers_then_publishes() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();

    let response = post_json(
        app.app(),
        &format!("/api/v1/tenants/{id}/domain-request"),
        json!({ "domain": "News.PineHollow.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["domainRequest"]["status"], "pending");
    assert_eq!(json["data"]["domainRequest"]["domain"], "news.pinehollow.com");

    let response = post_json(
        app.app(),
        &format!("/api/v1/tenants/{id}/domain-request/approve"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["domainRequest"]["status"], "approved");
    assert_eq!(json["data"]["customDomain"], "news.pinehollow.com");
    assert_eq!(*app.registrar.added.lock().unwrap(), ["news.pinehollow.com"]);
    assert_eq!(app.email.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn registrar_failure_returns_502_and_request_stays_pending() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();
    post_json(
        app.app(),
        &format!("/api/v1/tenants/{id}/domain-request"),
        json!({ "domain": "news.pinehollow.com" }),
    )
    .await;
    app.registrar.fail.store(true, Ordering::SeqCst);

    let response = post_json(
        app.app(),
        &format!("/api/v1/tenants/{id}/domain-request/approve"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["retryable"], true);

    let json = body_json(get(app.app(), &format!("/api/v1/tenants/{id}")).await).await;
    assert_eq!(json["data"]["domainRequest"]["status"], "pending");
    assert!(json["data"]["customDomain"].is_null());
}

#[tokio::test]
async fn reject_domain_requires_a_reason() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();
    post_json(
        app.app(),
        &format!("/api/v1/tenants/{id}/domain-request"),
        json!({ "domain": "news.pinehollow.com" }),
    )
    .await;

    let uri = format!("/api/v1/tenants/{id}/domain-request/reject");
    let response = post_json(app.app(), &uri, json!({ "reason": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app.app(), &uri, json!({ "reason": "Domain not owned" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["domainRequest"]["status"], "rejected");
    assert_eq!(json["data"]["domainRequest"]["rejectionReason"], "Domain not owned");
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_is_idempotent_and_frees_the_slug() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();

    let response = delete(app.app(), &format!("/api/v1/tenants/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["tenantDocumentFound"], true);
    assert_eq!(json["data"]["deleted"]["tenants"], 1);

    let response = delete(app.app(), &format!("/api/v1/tenants/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["tenantDocumentFound"], false);

    let json = body_json(get(app.app(), "/api/v1/slugs/pinehollow/availability").await).await;
    assert_eq!(json["data"]["available"], true);
}

#[tokio::test]
async fn interrupted_delete_reports_partial_cascade() {
    let app = common::build_test_app();
    let tenant = create_tenant(&app, "pinehollow").await;
    let id = tenant["id"].as_str().unwrap();
    post_json(app.app(), &format!("/api/v1/tenants/{id}/seed"), json!({})).await;
    app.store
        .fail_next_commit_touching(collections::AI_JOURNALISTS)
        .await;

    let response = delete(app.app(), &format!("/api/v1/tenants/{id}")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PARTIAL_CASCADE");
    assert_eq!(json["failedStep"], "aiJournalists");

    let response = delete(app.app(), &format!("/api/v1/tenants/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.count(collections::AI_JOURNALISTS).await, 0);
    assert_eq!(app.store.count(collections::TENANTS).await, 0);
}
