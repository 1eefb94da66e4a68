//! Repository for `onboardingSessions`, keyed by resume token.

use crate::error::StoreError;
use crate::models::onboarding_session::OnboardingSession;
use crate::store::{collections, DocumentStore, Versioned, WriteBatch};

pub struct OnboardingSessionRepo;

impl OnboardingSessionRepo {
    pub async fn find_by_token(
        store: &dyn DocumentStore,
        resume_token: &str,
    ) -> Result<Option<Versioned<OnboardingSession>>, StoreError> {
        store
            .get(collections::ONBOARDING_SESSIONS, resume_token)
            .await?
            .map(|doc| doc.decode_versioned())
            .transpose()
    }

    /// Insert a new session; fails with `AlreadyExists` if the token is taken.
    pub async fn create(store: &dyn DocumentStore, session: &OnboardingSession) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.create(
            collections::ONBOARDING_SESSIONS,
            session.resume_token.clone(),
            session,
        )?;
        store.commit(batch).await
    }

    /// Overwrite the session if it is still at `expected_version`, returning
    /// the version now stored.
    pub async fn update(
        store: &dyn DocumentStore,
        session: &OnboardingSession,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let mut batch = WriteBatch::new();
        batch.update(
            collections::ONBOARDING_SESSIONS,
            session.resume_token.clone(),
            session,
            Some(expected_version),
        )?;
        store.commit(batch).await?;
        Ok(expected_version + 1)
    }

    pub async fn delete(store: &dyn DocumentStore, resume_token: &str) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(collections::ONBOARDING_SESSIONS, resume_token);
        store.commit(batch).await
    }
}
