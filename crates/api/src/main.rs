use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsdesk_api::config::ServerConfig;
use newsdesk_api::router::build_app_router;
use newsdesk_api::state::AppState;
use newsdesk_core::collaborators::{DomainRegistrar, EmailSender};
use newsdesk_db::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use newsdesk_tenancy::email::{EmailConfig, SmtpEmailSender};
use newsdesk_tenancy::vercel::{VercelConfig, VercelDomainRegistrar};
use newsdesk_tenancy::Services;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "newsdesk_api=debug,newsdesk_tenancy=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        platform_domain = %config.platform_domain,
        "Loaded server configuration"
    );

    // --- Document store ---
    let store = open_store(&config).await;

    // --- Collaborators ---
    let registrar: Arc<dyn DomainRegistrar> =
        Arc::new(VercelDomainRegistrar::new(VercelConfig::from_env()));
    if !registrar.is_configured() {
        tracing::warn!("VERCEL_TOKEN not set, custom domain approval is disabled");
    }

    let email: Option<Arc<dyn EmailSender>> = match EmailConfig::from_env() {
        Some(email_config) => Some(Arc::new(SmtpEmailSender::new(email_config))),
        None => {
            tracing::warn!("SMTP_HOST not set, owner notifications are disabled");
            None
        }
    };

    // --- App state ---
    let services = Services::new(Arc::clone(&store), registrar, email, config.tenancy());
    let state = AppState {
        store,
        services,
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Connect to PostgreSQL when `DATABASE_URL` is set, otherwise keep
/// documents in memory for local development.
async fn open_store(config: &ServerConfig) -> Arc<dyn DocumentStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory document store");
        return Arc::new(MemoryDocumentStore::new());
    };

    let pool = newsdesk_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    newsdesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    newsdesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(PgDocumentStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
