//! Tenant slug rules and availability verdicts.
//!
//! A slug doubles as the tenant's platform subdomain, so it is restricted to
//! lowercase ASCII letters and digits. Uniqueness is checked against the
//! document store by the lifecycle manager; everything that can be decided
//! without I/O lives here.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MIN_SLUG_LENGTH: usize = 3;
pub const MAX_SLUG_LENGTH: usize = 30;

/// Subdomains the platform keeps for itself.
pub const RESERVED_SLUGS: &[&str] = &[
    "admin",
    "api",
    "app",
    "www",
    "mail",
    "email",
    "ftp",
    "blog",
    "dashboard",
    "login",
    "logout",
    "signup",
    "register",
    "onboarding",
    "billing",
    "support",
    "help",
    "status",
    "static",
    "assets",
    "cdn",
    "docs",
    "settings",
    "account",
    "root",
    "system",
    "test",
    "staging",
    "dev",
    "news",
];

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").expect("slug pattern is a valid regex"));

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate slug length and character set.
pub fn validate_slug_format(slug: &str) -> Result<(), CoreError> {
    let len = slug.chars().count();
    if !(MIN_SLUG_LENGTH..=MAX_SLUG_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "Slug must be between {MIN_SLUG_LENGTH} and {MAX_SLUG_LENGTH} characters, got {len}"
        )));
    }
    if !SLUG_PATTERN.is_match(slug) {
        return Err(CoreError::Validation(format!(
            "Slug '{slug}' may only contain lowercase letters and digits"
        )));
    }
    Ok(())
}

/// Check whether a slug is one of the platform's reserved words.
pub fn is_reserved(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug.to_lowercase().as_str())
}

/// Run every rule that does not need the store: format, then reserved words.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    validate_slug_format(slug)?;
    if is_reserved(slug) {
        return Err(CoreError::Conflict(format!("Slug '{slug}' is reserved")));
    }
    Ok(())
}

static CATEGORY_SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("category slug pattern is a valid regex")
});

/// Category slugs key the categories subcollection, so they must be present
/// and stable: lowercase words joined by single hyphens.
pub fn validate_category_slug(slug: Option<&str>, category_name: &str) -> Result<String, CoreError> {
    let slug = slug.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        CoreError::Validation(format!("Category '{category_name}' has no slug"))
    })?;
    if slug.len() > 64 || !CATEGORY_SLUG_PATTERN.is_match(slug) {
        return Err(CoreError::Validation(format!(
            "Category slug '{slug}' must be lowercase words separated by hyphens"
        )));
    }
    Ok(slug.to_string())
}

/// The public hostname a slug maps to on the platform domain.
pub fn subdomain_for(slug: &str, platform_domain: &str) -> String {
    format!("{}.{}", slug.to_lowercase(), platform_domain.trim_start_matches('.'))
}

/// Derive a candidate slug from a newspaper or business name.
///
/// Drops everything that is not an ASCII letter or digit and truncates to
/// [`MAX_SLUG_LENGTH`]. The result may still fail [`validate_slug`].
pub fn suggest_slug(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_SLUG_LENGTH)
        .collect()
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Why a slug cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugRejection {
    Invalid,
    Reserved,
    Taken,
}

/// Result of a slug availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugAvailability {
    pub slug: String,
    pub available: bool,
    pub rejection: Option<SlugRejection>,
    pub message: Option<String>,
    /// Platform subdomain the slug would be served from, when available.
    pub suggested_subdomain: Option<String>,
}

impl SlugAvailability {
    /// Build the verdict for `slug` given whether another tenant already uses it.
    pub fn evaluate(slug: &str, taken: bool, platform_domain: &str) -> Self {
        let rejected = |rejection, message: String| Self {
            slug: slug.to_string(),
            available: false,
            rejection: Some(rejection),
            message: Some(message),
            suggested_subdomain: None,
        };

        if let Err(err) = validate_slug_format(slug) {
            return rejected(SlugRejection::Invalid, err.to_string());
        }
        if is_reserved(slug) {
            return rejected(SlugRejection::Reserved, format!("'{slug}' is reserved"));
        }
        if taken {
            return rejected(SlugRejection::Taken, format!("'{slug}' is already in use"));
        }

        Self {
            slug: slug.to_string(),
            available: true,
            rejection: None,
            message: None,
            suggested_subdomain: Some(subdomain_for(slug, platform_domain)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
