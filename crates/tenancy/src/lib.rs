//! The stateful tenancy components: credit ledger, tenant lifecycle, setup
//! progress tracking and onboarding sessions, plus the AI settings service
//! and the concrete external collaborators.
//!
//! Every component talks to the document store through the repositories in
//! `newsdesk-db`; [`Services`] wires them together over one store.

pub mod email;
pub mod ledger;
pub mod lifecycle;
pub mod locks;
pub mod notify;
pub mod onboarding;
pub mod progress;
pub mod settings;
pub mod vercel;

use std::sync::Arc;
use std::time::Duration;

use validator::Validate;

use newsdesk_core::collaborators::{DomainRegistrar, EmailSender};
use newsdesk_core::error::CoreError;
use newsdesk_db::DocumentStore;

pub use ledger::{CreditLedger, DebitReceipt};
pub use lifecycle::TenantLifecycle;
pub use locks::TenantLocks;
pub use notify::Notifier;
pub use onboarding::OnboardingStore;
pub use progress::SetupTracker;
pub use settings::AiSettingsService;

/// Default platform domain tenant subdomains hang off.
pub const DEFAULT_PLATFORM_DOMAIN: &str = "newsdesk.local";

/// Settings shared by the tenancy components.
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    pub platform_domain: String,
    pub ai_settings_ttl: Duration,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            platform_domain: DEFAULT_PLATFORM_DOMAIN.to_string(),
            ai_settings_ttl: Duration::from_secs(300),
        }
    }
}

/// All tenancy components over one document store.
#[derive(Clone)]
pub struct Services {
    pub ledger: CreditLedger,
    pub lifecycle: TenantLifecycle,
    pub progress: SetupTracker,
    pub onboarding: OnboardingStore,
    pub settings: AiSettingsService,
}

impl Services {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registrar: Arc<dyn DomainRegistrar>,
        email: Option<Arc<dyn EmailSender>>,
        config: TenancyConfig,
    ) -> Self {
        let notifier = Notifier::new(email);
        let settings = AiSettingsService::new(Arc::clone(&store), config.ai_settings_ttl);
        let progress = SetupTracker::new(Arc::clone(&store));
        let onboarding = OnboardingStore::new(Arc::clone(&store));
        let ledger = CreditLedger::new(
            Arc::clone(&store),
            Arc::new(TenantLocks::new()),
            notifier.clone(),
        );
        let lifecycle = TenantLifecycle::new(
            store,
            registrar,
            notifier,
            progress.clone(),
            onboarding.clone(),
            settings.clone(),
            config.platform_domain,
        );
        Self {
            ledger,
            lifecycle,
            progress,
            onboarding,
            settings,
        }
    }
}

/// Run `validator` rules on an inbound DTO, mapping failures onto the
/// domain taxonomy.
pub(crate) fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))
}
