//! Domain rules for the newsdesk tenancy platform.
//!
//! This crate has no I/O: it holds the error taxonomy, the tenant and
//! domain-request state machines, credit arithmetic, setup progress rules,
//! onboarding wizard rules, secret generation, the TTL cache, and the
//! collaborator traits implemented elsewhere.

pub mod cache;
pub mod collaborators;
pub mod credits;
pub mod error;
pub mod onboarding;
pub mod setup_progress;
pub mod slug;
pub mod tenant;
pub mod tokens;
pub mod types;
