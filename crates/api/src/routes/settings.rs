use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Platform settings routes -- mounted at `/settings`.
///
/// ```text
/// GET    /ai                              get_ai_settings
/// PUT    /ai                              update_ai_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/ai",
        get(settings::get_ai_settings).put(settings::update_ai_settings),
    )
}
