//! Onboarding sessions and provisioning from them.

mod common;

use assert_matches::assert_matches;

use newsdesk_core::error::CoreError;
use newsdesk_core::onboarding::{DomainOption, OnboardingStatus};
use newsdesk_core::tenant::{DomainRequestStatus, TenantStatus};
use newsdesk_core::tokens::RESUME_TOKEN_LENGTH;
use newsdesk_db::models::onboarding_session::SaveOnboardingSession;
use newsdesk_db::collections;

use common::{category, harness, service_area};

fn wizard(step: u8) -> SaveOnboardingSession {
    SaveOnboardingSession {
        resume_token: None,
        domain_option: Some(DomainOption::Subdomain),
        domain: Some("pinehollow".to_string()),
        service_area: Some(service_area()),
        selected_categories: vec![category("Local News", "local-news")],
        owner_email: Some("owner@pinehollow.test".to_string()),
        newspaper_name: Some("Pine Hollow Gazette".to_string()),
        current_step: step,
    }
}

#[tokio::test]
async fn first_save_mints_a_token_and_later_saves_overwrite() {
    let h = harness();
    let store = &h.services.onboarding;

    let first = store.save(wizard(1)).await.unwrap();
    assert_eq!(first.resume_token.len(), RESUME_TOKEN_LENGTH);
    assert_eq!(first.status, OnboardingStatus::InProgress);

    let mut next = wizard(3);
    next.resume_token = Some(first.resume_token.clone());
    next.owner_email = None;
    let second = store.save(next).await.unwrap();
    assert_eq!(second.resume_token, first.resume_token);
    assert_eq!(second.created_at, first.created_at);

    let loaded = store.load(&first.resume_token).await.unwrap();
    assert_eq!(loaded.current_step, 3);
    // Full overwrite: the omitted field is gone.
    assert_eq!(loaded.owner_email, None);
}

#[tokio::test]
async fn unknown_or_malformed_tokens_are_not_found() {
    let h = harness();
    let store = &h.services.onboarding;
    assert_matches!(store.load("short").await, Err(CoreError::NotFound { .. }));
    assert_matches!(
        store.load(&"a".repeat(RESUME_TOKEN_LENGTH)).await,
        Err(CoreError::NotFound { .. })
    );

    let mut forged = wizard(2);
    forged.resume_token = Some("b".repeat(RESUME_TOKEN_LENGTH));
    assert_matches!(store.save(forged).await, Err(CoreError::NotFound { .. }));
}

#[tokio::test]
async fn save_validates_fields() {
    let h = harness();
    let mut bad_step = wizard(1);
    bad_step.current_step = 7;
    assert_matches!(h.services.onboarding.save(bad_step).await, Err(CoreError::Validation(_)));

    let mut bad_email = wizard(1);
    bad_email.owner_email = Some("nope".to_string());
    assert_matches!(h.services.onboarding.save(bad_email).await, Err(CoreError::Validation(_)));
}

#[tokio::test]
async fn delete_is_best_effort() {
    let h = harness();
    let session = h.services.onboarding.save(wizard(1)).await.unwrap();
    h.services.onboarding.delete(&session.resume_token).await;
    h.services.onboarding.delete(&session.resume_token).await;
    assert_eq!(h.store.count(collections::ONBOARDING_SESSIONS).await, 0);
}

#[tokio::test]
async fn provisioning_requires_the_review_step() {
    let h = harness();
    let session = h.services.onboarding.save(wizard(4)).await.unwrap();
    assert_matches!(
        h.services.lifecycle.provision_from_session(&session.resume_token).await,
        Err(CoreError::Validation(_))
    );
    assert_eq!(h.store.count(collections::TENANTS).await, 0);
}

#[tokio::test]
async fn provisioning_creates_the_tenant_and_closes_the_session() {
    let h = harness();
    let session = h.services.onboarding.save(wizard(6)).await.unwrap();

    let created = h
        .services
        .lifecycle
        .provision_from_session(&session.resume_token)
        .await
        .unwrap();
    let tenant = created.tenant;
    assert_eq!(tenant.slug, "pinehollow");
    assert_eq!(tenant.business_name, "Pine Hollow Gazette");
    assert_eq!(tenant.status, TenantStatus::Provisioning);
    assert_eq!(tenant.owner_email.as_deref(), Some("owner@pinehollow.test"));

    let closed = h.services.onboarding.load(&session.resume_token).await.unwrap();
    assert_eq!(closed.status, OnboardingStatus::Complete);
    assert_eq!(closed.tenant_id, Some(tenant.id));
    assert!(h.services.progress.get(tenant.id).await.is_ok());
    h.services
        .lifecycle
        .verify_api_key(tenant.id, &created.api_key)
        .await
        .unwrap();

    // Terminal: no more edits, no second tenant.
    let mut edit = wizard(6);
    edit.resume_token = Some(session.resume_token.clone());
    assert_matches!(h.services.onboarding.save(edit).await, Err(CoreError::Conflict(_)));
    assert_matches!(
        h.services.lifecycle.provision_from_session(&session.resume_token).await,
        Err(CoreError::Conflict(_))
    );

    // Deleting the session leaves the tenant alone.
    h.services.onboarding.delete(&session.resume_token).await;
    assert!(h.services.lifecycle.get_tenant(tenant.id).await.is_ok());
}

#[tokio::test]
async fn custom_domain_sessions_open_a_domain_request() {
    let h = harness();
    let mut input = wizard(6);
    input.domain_option = Some(DomainOption::CustomDomain);
    input.domain = Some("PineHollowGazette.com".to_string());
    let session = h.services.onboarding.save(input).await.unwrap();

    let tenant = h
        .services
        .lifecycle
        .provision_from_session(&session.resume_token)
        .await
        .unwrap()
        .tenant;
    assert_eq!(tenant.slug, "pinehollowgazette");
    assert_eq!(tenant.domain_request_status(), Some(DomainRequestStatus::Pending));
    assert_eq!(
        tenant.domain_request.as_ref().map(|r| r.domain.as_str()),
        Some("pinehollowgazette.com")
    );
}

#[tokio::test]
async fn failed_provisioning_reopens_the_session() {
    let h = harness();
    common::create_tenant(&h, "pinehollow").await;
    let session = h.services.onboarding.save(wizard(6)).await.unwrap();

    assert_matches!(
        h.services.lifecycle.provision_from_session(&session.resume_token).await,
        Err(CoreError::Conflict(_))
    );
    let reopened = h.services.onboarding.load(&session.resume_token).await.unwrap();
    assert_eq!(reopened.status, OnboardingStatus::InProgress);
    assert_eq!(h.store.count(collections::TENANTS).await, 1);

    // The owner picks another name and tries again.
    let mut fixed = wizard(6);
    fixed.resume_token = Some(session.resume_token.clone());
    fixed.domain = Some("pinehollowgazette".to_string());
    h.services.onboarding.save(fixed).await.unwrap();
    let tenant = h
        .services
        .lifecycle
        .provision_from_session(&session.resume_token)
        .await
        .unwrap()
        .tenant;
    assert_eq!(tenant.slug, "pinehollowgazette");
    assert_eq!(h.store.count(collections::TENANTS).await, 2);
}

#[tokio::test]
async fn provisioning_resumes_when_closing_the_session_fails() {
    let h = harness();
    let session = h.services.onboarding.save(wizard(6)).await.unwrap();
    let lifecycle = &h.services.lifecycle;

    // First session write (seeding) goes through, the closing one fails.
    h.store
        .fail_nth_commit_touching(collections::ONBOARDING_SESSIONS, 2)
        .await;
    assert_matches!(
        lifecycle.provision_from_session(&session.resume_token).await,
        Err(CoreError::Internal(_))
    );
    let stuck = h.services.onboarding.load(&session.resume_token).await.unwrap();
    assert_eq!(stuck.status, OnboardingStatus::Seeding);
    let tenant_id = stuck.tenant_id.unwrap();
    assert!(lifecycle.get_tenant(tenant_id).await.is_ok());

    let created = lifecycle
        .provision_from_session(&session.resume_token)
        .await
        .unwrap();
    assert_eq!(created.tenant.id, tenant_id);
    assert_eq!(h.store.count(collections::TENANTS).await, 1);
    let closed = h.services.onboarding.load(&session.resume_token).await.unwrap();
    assert_eq!(closed.status, OnboardingStatus::Complete);
    lifecycle.verify_api_key(tenant_id, &created.api_key).await.unwrap();
}

#[tokio::test]
async fn provisioning_resumes_when_the_domain_request_fails() {
    let h = harness();
    let mut input = wizard(6);
    input.domain_option = Some(DomainOption::CustomDomain);
    input.domain = Some("pinehollowgazette.com".to_string());
    let session = h.services.onboarding.save(input).await.unwrap();
    let lifecycle = &h.services.lifecycle;

    // Tenant creation goes through, the domain request write fails.
    h.store.fail_nth_commit_touching(collections::TENANTS, 2).await;
    assert!(lifecycle.provision_from_session(&session.resume_token).await.is_err());
    let stuck = h.services.onboarding.load(&session.resume_token).await.unwrap();
    assert_eq!(stuck.status, OnboardingStatus::Seeding);
    let half_done = lifecycle.get_tenant(stuck.tenant_id.unwrap()).await.unwrap();
    assert_eq!(half_done.domain_request, None);

    let tenant = lifecycle
        .provision_from_session(&session.resume_token)
        .await
        .unwrap()
        .tenant;
    assert_eq!(tenant.id, half_done.id);
    assert_eq!(tenant.domain_request_status(), Some(DomainRequestStatus::Pending));
    assert_eq!(h.store.count(collections::TENANTS).await, 1);
    assert_eq!(
        h.services.onboarding.load(&session.resume_token).await.unwrap().status,
        OnboardingStatus::Complete
    );
}

#[tokio::test]
async fn concurrent_provisioning_creates_one_tenant() {
    let h = harness();
    let session = h.services.onboarding.save(wizard(6)).await.unwrap();
    let lifecycle = &h.services.lifecycle;

    let (a, b) = tokio::join!(
        lifecycle.provision_from_session(&session.resume_token),
        lifecycle.provision_from_session(&session.resume_token),
    );
    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    assert_matches!(a.err().or(b.err()), Some(CoreError::Conflict(_)));
    assert_eq!(h.store.count(collections::TENANTS).await, 1);
}
