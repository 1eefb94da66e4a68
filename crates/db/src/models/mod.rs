pub mod credit;
pub mod journalist;
pub mod onboarding_session;
pub mod settings;
pub mod setup_progress;
pub mod tenant;
