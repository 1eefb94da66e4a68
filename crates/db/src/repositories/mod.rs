//! Repositories over the document store.
//!
//! Each repository is a zero-sized struct with async methods that take the
//! store as their first argument.

pub mod cascade_repo;
pub mod credit_repo;
pub mod journalist_repo;
pub mod onboarding_session_repo;
pub mod settings_repo;
pub mod setup_progress_repo;
pub mod tenant_repo;

pub use cascade_repo::CascadeRepo;
pub use credit_repo::CreditRepo;
pub use journalist_repo::JournalistRepo;
pub use onboarding_session_repo::OnboardingSessionRepo;
pub use settings_repo::SettingsRepo;
pub use setup_progress_repo::SetupProgressRepo;
pub use tenant_repo::TenantRepo;
