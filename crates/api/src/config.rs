use std::time::Duration;

use newsdesk_tenancy::{TenancyConfig, DEFAULT_PLATFORM_DOMAIN};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL connection string. Without it the server keeps its
    /// documents in memory.
    pub database_url: Option<String>,
    /// Domain tenant subdomains hang off (default: `newsdesk.local`).
    pub platform_domain: String,
    /// How long AI settings are cached, in seconds (default: `300`).
    pub ai_settings_ttl_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `DATABASE_URL`         | unset (in-memory store)    |
    /// | `PLATFORM_DOMAIN`      | `newsdesk.local`           |
    /// | `AI_SETTINGS_TTL_SECS` | `300`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let platform_domain = std::env::var("PLATFORM_DOMAIN")
            .ok()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_PLATFORM_DOMAIN.to_string());

        let ai_settings_ttl_secs: u64 = std::env::var("AI_SETTINGS_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("AI_SETTINGS_TTL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            platform_domain,
            ai_settings_ttl_secs,
        }
    }

    /// The subset handed to the tenancy services.
    pub fn tenancy(&self) -> TenancyConfig {
        TenancyConfig {
            platform_domain: self.platform_domain.clone(),
            ai_settings_ttl: Duration::from_secs(self.ai_settings_ttl_secs),
        }
    }
}
