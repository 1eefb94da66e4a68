//! Route definitions for setup progress tracking.
//!
//! Merged into the `/tenants` tree by `api_routes()`.
//!
//! ```text
//! GET    /{id}/progress                   get_progress
//! POST   /{id}/progress/advance           advance
//! POST   /{id}/progress/articles          record_article (x-api-key)
//! POST   /{id}/progress/errors            record_error (x-api-key)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::progress;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/progress", get(progress::get_progress))
        .route("/{id}/progress/advance", post(progress::advance))
        .route("/{id}/progress/articles", post(progress::record_article))
        .route("/{id}/progress/errors", post(progress::record_error))
}
