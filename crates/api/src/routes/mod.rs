pub mod credits;
pub mod health;
pub mod onboarding;
pub mod progress;
pub mod settings;
pub mod tenants;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /slugs/{slug}/availability                      slug check
///
/// /tenants                                        create
/// /tenants/{id}                                   get, cascading delete
/// /tenants/{id}/api-key                           rotate API key (POST)
/// /tenants/{id}/deployment                        record site deployment (PUT)
/// /tenants/{id}/seed                              begin seeding (POST)
/// /tenants/{id}/activate                          activate (POST)
/// /tenants/{id}/licensing                         licensing status (PUT)
/// /tenants/{id}/domain-request                    request custom domain (POST)
/// /tenants/{id}/domain-request/approve            approve (POST)
/// /tenants/{id}/domain-request/reject             reject (POST)
///
/// /tenants/{id}/credits                           current ledger entry
/// /tenants/{id}/credits/cycles                    allocate cycle (POST)
/// /tenants/{id}/credits/authorize                 authorize (POST)
/// /tenants/{id}/credits/charge                    charge (POST, x-api-key)
/// /tenants/{id}/credits/transactions              transaction history
/// /tenants/{id}/credits/reconcile                 reconcile ledger
///
/// /tenants/{id}/progress                          progress + percent complete
/// /tenants/{id}/progress/advance                  advance step (POST)
/// /tenants/{id}/progress/articles                 article generated (POST, x-api-key)
/// /tenants/{id}/progress/errors                   record error (POST, x-api-key)
///
/// /onboarding                                     save wizard session (PUT)
/// /onboarding/{token}                             load, delete
/// /onboarding/{token}/provision                   provision tenant (POST)
///
/// /settings/ai                                    get, update
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/slugs/{slug}/availability",
            get(handlers::tenants::check_slug),
        )
        // Tenant lifecycle, plus the per-tenant ledger and setup progress.
        .nest(
            "/tenants",
            tenants::router()
                .merge(credits::router())
                .merge(progress::router()),
        )
        .nest("/onboarding", onboarding::router())
        .nest("/settings", settings::router())
}
