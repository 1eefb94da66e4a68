//! Route definitions for the per-tenant credit ledger.
//!
//! Merged into the `/tenants` tree by `api_routes()`.
//!
//! ```text
//! GET    /{id}/credits                    current_entry
//! POST   /{id}/credits/cycles             allocate_cycle
//! POST   /{id}/credits/authorize          authorize
//! POST   /{id}/credits/charge             charge (x-api-key)
//! GET    /{id}/credits/transactions       list_transactions (?limit)
//! GET    /{id}/credits/reconcile          reconcile
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::credits;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/credits", get(credits::current_entry))
        .route("/{id}/credits/cycles", post(credits::allocate_cycle))
        .route("/{id}/credits/authorize", post(credits::authorize))
        .route("/{id}/credits/charge", post(credits::charge))
        .route(
            "/{id}/credits/transactions",
            get(credits::list_transactions),
        )
        .route("/{id}/credits/reconcile", get(credits::reconcile))
}
