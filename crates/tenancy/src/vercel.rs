//! Domain registration against the Vercel REST API.
//!
//! [`VercelDomainRegistrar`] implements [`DomainRegistrar`]. Without a token
//! it reports itself unconfigured and fails every call, so domain approvals
//! stay pending instead of being recorded without a registration.

use async_trait::async_trait;
use serde::Deserialize;

use newsdesk_core::collaborators::DomainRegistrar;
use newsdesk_core::error::CoreError;

const DEFAULT_API_URL: &str = "https://api.vercel.com";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum VercelError {
    #[error("Vercel is not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Vercel API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl From<VercelError> for CoreError {
    fn from(err: VercelError) -> Self {
        CoreError::Collaborator {
            collaborator: "vercel",
            reason: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VercelConfig {
    pub token: String,
    pub team_id: Option<String>,
    pub api_url: String,
}

impl VercelConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `VERCEL_TOKEN` is not set.
    ///
    /// | Variable         | Required | Default                  |
    /// |------------------|----------|--------------------------|
    /// | `VERCEL_TOKEN`   | yes      |                          |
    /// | `VERCEL_TEAM_ID` | no       |                          |
    /// | `VERCEL_API_URL` | no       | `https://api.vercel.com` |
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("VERCEL_TOKEN").ok().filter(|t| !t.is_empty())?;
        Some(Self {
            token,
            team_id: std::env::var("VERCEL_TEAM_ID").ok(),
            api_url: std::env::var("VERCEL_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Registrar
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProjectDomain {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectDomains {
    domains: Vec<ProjectDomain>,
}

pub struct VercelDomainRegistrar {
    client: reqwest::Client,
    config: Option<VercelConfig>,
}

impl VercelDomainRegistrar {
    pub fn new(config: Option<VercelConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn config(&self) -> Result<&VercelConfig, VercelError> {
        self.config.as_ref().ok_or(VercelError::NotConfigured)
    }

    fn url(config: &VercelConfig, path: &str) -> String {
        match &config.team_id {
            Some(team) => format!("{}{path}?teamId={team}", config.api_url),
            None => format!("{}{path}", config.api_url),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VercelError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(VercelError::Api {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn try_add_domain(&self, project_id: &str, domain: &str) -> Result<(), VercelError> {
        let config = self.config()?;
        let response = self
            .client
            .post(Self::url(config, &format!("/v10/projects/{project_id}/domains")))
            .bearer_auth(&config.token)
            .json(&serde_json::json!({ "name": domain }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    pub async fn try_project_domains(&self, project_id: &str) -> Result<Vec<String>, VercelError> {
        let config = self.config()?;
        let response = self
            .client
            .get(Self::url(config, &format!("/v9/projects/{project_id}/domains")))
            .bearer_auth(&config.token)
            .send()
            .await?;
        let domains: ProjectDomains = Self::check_status(response).await?.json().await?;
        Ok(domains.domains.into_iter().map(|d| d.name).collect())
    }
}

#[async_trait]
impl DomainRegistrar for VercelDomainRegistrar {
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn add_domain(&self, project_id: &str, domain: &str) -> Result<(), CoreError> {
        self.try_add_domain(project_id, domain).await?;
        tracing::info!(project_id, domain, "Domain added to Vercel project");
        Ok(())
    }

    async fn project_domains(&self, project_id: &str) -> Result<Vec<String>, CoreError> {
        Ok(self.try_project_domains(project_id).await?)
    }
}
