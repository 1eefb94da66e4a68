//! Interfaces of the external services the tenancy core depends on.
//!
//! Implementations live in `newsdesk-tenancy`; tests substitute fakes.
//! Every call is fallible and none of them can be rolled back, so callers
//! only persist a state transition after the collaborator has succeeded.

use async_trait::async_trait;

use crate::error::CoreError;

/// Registers custom domains with the hosting provider.
#[async_trait]
pub trait DomainRegistrar: Send + Sync {
    /// Whether credentials are present. Unconfigured registrars fail every call.
    fn is_configured(&self) -> bool;

    /// Attach `domain` to the hosting project.
    async fn add_domain(&self, project_id: &str, domain: &str) -> Result<(), CoreError>;

    /// Domain names currently attached to the hosting project.
    async fn project_domains(&self, project_id: &str) -> Result<Vec<String>, CoreError>;
}

/// A rendered transactional email. The body is plain text and is sent as
/// such, so nothing interpolated into it is ever interpreted as markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub bcc: Vec<String>,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send the message, returning the provider's message id.
    async fn send_email(&self, email: &OutgoingEmail) -> Result<String, CoreError>;
}
