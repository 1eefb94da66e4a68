use std::sync::Arc;

use newsdesk_db::DocumentStore;
use newsdesk_tenancy::Services;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind an `Arc` or is a service
/// handle that clones its own `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Backing document store, used directly only by the health check.
    pub store: Arc<dyn DocumentStore>,
    /// Ledger, lifecycle, progress, onboarding and settings services.
    pub services: Services,
    pub config: Arc<ServerConfig>,
}
