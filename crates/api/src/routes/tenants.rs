//! Route definitions for tenant lifecycle management.
//!
//! Mounted at `/tenants` by `api_routes()`.
//!
//! ```text
//! POST   /                                create_tenant
//! GET    /{id}                            get_tenant
//! DELETE /{id}                            delete_tenant
//! POST   /{id}/api-key                    rotate_api_key
//! PUT    /{id}/deployment                 record_deployment
//! POST   /{id}/seed                       begin_seeding
//! POST   /{id}/activate                   activate
//! PUT    /{id}/licensing                  update_licensing
//! POST   /{id}/domain-request             request_domain
//! POST   /{id}/domain-request/approve     approve_domain
//! POST   /{id}/domain-request/reject      reject_domain
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::tenants;
use crate::state::AppState;

/// Tenant routes -- mounted at `/tenants`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(tenants::create_tenant))
        .route(
            "/{id}",
            get(tenants::get_tenant).delete(tenants::delete_tenant),
        )
        .route("/{id}/api-key", post(tenants::rotate_api_key))
        .route("/{id}/deployment", put(tenants::record_deployment))
        .route("/{id}/seed", post(tenants::begin_seeding))
        .route("/{id}/activate", post(tenants::activate))
        .route("/{id}/licensing", put(tenants::update_licensing))
        .route("/{id}/domain-request", post(tenants::request_domain))
        .route(
            "/{id}/domain-request/approve",
            post(tenants::approve_domain),
        )
        .route("/{id}/domain-request/reject", post(tenants::reject_domain))
}
