//! Route definitions for resumable onboarding wizard sessions.
//!
//! Mounted at `/onboarding` by `api_routes()`.
//!
//! ```text
//! PUT    /                                save_session
//! GET    /{token}                         load_session
//! DELETE /{token}                         delete_session
//! POST   /{token}/provision               provision
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

/// Onboarding routes -- mounted at `/onboarding`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", put(onboarding::save_session))
        .route(
            "/{token}",
            get(onboarding::load_session).delete(onboarding::delete_session),
        )
        .route("/{token}/provision", post(onboarding::provision))
}
