//! Onboarding session store.
//!
//! Sessions are keyed by an unguessable resume token and hold the whole
//! wizard state. Every save overwrites the stored document, but only if
//! nobody else wrote it since it was read.

use std::sync::Arc;

use chrono::Utc;

use newsdesk_core::error::CoreError;
use newsdesk_core::onboarding::{can_save_session, validate_step_number, OnboardingStatus};
use newsdesk_core::tokens::{generate_resume_token, is_well_formed, RESUME_TOKEN_LENGTH};
use newsdesk_db::models::onboarding_session::{OnboardingSession, SaveOnboardingSession};
use newsdesk_db::repositories::OnboardingSessionRepo;
use newsdesk_db::{DocumentStore, Versioned};

use crate::validate_input;

#[derive(Clone)]
pub struct OnboardingStore {
    store: Arc<dyn DocumentStore>,
}

impl OnboardingStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Save the wizard state, minting a resume token on the first save.
    pub async fn save(&self, input: SaveOnboardingSession) -> Result<OnboardingSession, CoreError> {
        validate_input(&input)?;
        validate_step_number(input.current_step)?;

        let now = Utc::now();
        let existing = match input.resume_token.as_deref() {
            Some(token) => {
                let existing = self.load_versioned(token).await?;
                can_save_session(existing.value.status)?;
                Some(existing)
            }
            None => None,
        };

        let session = OnboardingSession {
            resume_token: input.resume_token.unwrap_or_else(generate_resume_token),
            domain_option: input.domain_option,
            domain: input.domain,
            service_area: input.service_area,
            selected_categories: input.selected_categories,
            owner_email: input.owner_email,
            newspaper_name: input.newspaper_name,
            current_step: input.current_step,
            status: OnboardingStatus::InProgress,
            tenant_id: existing.as_ref().and_then(|e| e.value.tenant_id),
            created_at: existing.as_ref().map_or(now, |e| e.value.created_at),
            updated_at: now,
        };
        match &existing {
            Some(e) => {
                OnboardingSessionRepo::update(self.store.as_ref(), &session, e.version).await?;
            }
            None => OnboardingSessionRepo::create(self.store.as_ref(), &session).await?,
        }

        tracing::debug!(step = session.current_step, "Onboarding session saved");
        Ok(session)
    }

    pub async fn load(&self, resume_token: &str) -> Result<OnboardingSession, CoreError> {
        Ok(self.load_versioned(resume_token).await?.value)
    }

    pub(crate) async fn load_versioned(
        &self,
        resume_token: &str,
    ) -> Result<Versioned<OnboardingSession>, CoreError> {
        // Malformed tokens cannot exist; skip the lookup.
        if !is_well_formed(resume_token, RESUME_TOKEN_LENGTH) {
            return Err(CoreError::not_found("OnboardingSession", "<invalid token>"));
        }
        OnboardingSessionRepo::find_by_token(self.store.as_ref(), resume_token)
            .await?
            .ok_or_else(|| CoreError::not_found("OnboardingSession", "<token>"))
    }

    /// Best-effort cleanup: a missing session or a store failure is logged,
    /// never returned.
    pub async fn delete(&self, resume_token: &str) {
        if let Err(e) = OnboardingSessionRepo::delete(self.store.as_ref(), resume_token).await {
            tracing::warn!(error = %e, "Failed to delete onboarding session");
        }
    }

    /// Write `session` back over the version it was read at. A concurrent
    /// writer turns this into a `Conflict`.
    pub(crate) async fn replace(
        &self,
        mut session: OnboardingSession,
        expected_version: i64,
    ) -> Result<Versioned<OnboardingSession>, CoreError> {
        session.updated_at = Utc::now();
        let version =
            OnboardingSessionRepo::update(self.store.as_ref(), &session, expected_version).await?;
        tracing::debug!(status = session.status.as_str(), "Onboarding session status changed");
        Ok(Versioned {
            value: session,
            version,
        })
    }
}
