pub mod credits;
pub mod onboarding;
pub mod progress;
pub mod settings;
pub mod tenants;
