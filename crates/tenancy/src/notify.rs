//! Owner notifications.
//!
//! Notifications follow a state change that has already been committed, so
//! a failed send is logged and otherwise ignored.

use std::sync::Arc;

use newsdesk_core::collaborators::{EmailSender, OutgoingEmail};
use newsdesk_core::credits::CreditBalance;
use newsdesk_db::models::tenant::Tenant;

#[derive(Clone, Default)]
pub struct Notifier {
    sender: Option<Arc<dyn EmailSender>>,
}

impl Notifier {
    pub fn new(sender: Option<Arc<dyn EmailSender>>) -> Self {
        Self { sender }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Send `email` if a sender is configured. Never fails.
    pub async fn send(&self, email: OutgoingEmail) {
        let Some(sender) = &self.sender else {
            tracing::debug!(subject = %email.subject, "Email not configured, skipping notification");
            return;
        };
        match sender.send_email(&email).await {
            Ok(message_id) => {
                tracing::info!(to = %email.to, subject = %email.subject, %message_id, "Notification sent");
            }
            Err(e) => {
                tracing::warn!(to = %email.to, subject = %email.subject, error = %e, "Notification failed");
            }
        }
    }

    /// Email the tenant owner, if the tenant has one on record.
    pub async fn send_to_owner(&self, tenant: &Tenant, subject: String, body: String) {
        let Some(to) = tenant.owner_email.clone() else {
            tracing::debug!(tenant_id = %tenant.id, "Tenant has no owner email, skipping notification");
            return;
        };
        self.send(OutgoingEmail {
            to,
            subject,
            body,
            bcc: Vec::new(),
        })
        .await;
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------
//
// Plain text only. Business names and rejection reasons are free text from
// users and admins.

pub fn soft_limit_warning(tenant: &Tenant, balance: &CreditBalance) -> (String, String) {
    let subject = format!("{}: credit usage warning", tenant.business_name);
    let body = format!(
        "{} has used {} of its {} monthly credits (warning threshold {}).\n\n\
         {} credits remain in this cycle.\n",
        tenant.business_name,
        balance.credits_used,
        balance.monthly_allocation,
        balance.soft_limit,
        balance.credits_remaining,
    );
    (subject, body)
}

pub fn domain_approved(tenant: &Tenant, domain: &str) -> (String, String) {
    (
        format!("{}: custom domain approved", tenant.business_name),
        format!("Your newspaper is now served at https://{domain}\n"),
    )
}

pub fn domain_rejected(tenant: &Tenant, domain: &str, reason: &str) -> (String, String) {
    (
        format!("{}: custom domain request declined", tenant.business_name),
        format!("The request for {domain} was declined.\n\nReason: {reason}\n"),
    )
}
