//! Bearer secrets: tenant API keys and onboarding resume tokens, drawn from
//! the thread-local CSPRNG.
//!
//! API keys are handed out once and stored only as a SHA-256 digest plus a
//! short display prefix. Resume tokens are the document id of their session.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a tenant API key (alphanumeric characters).
pub const API_KEY_LENGTH: usize = 48;

/// Leading characters of an API key kept in clear for identification.
pub const API_KEY_PREFIX_LENGTH: usize = 8;

/// Length of an onboarding resume token (alphanumeric characters).
pub const RESUME_TOKEN_LENGTH: usize = 32;

/// A freshly minted API key.
pub struct GeneratedApiKey {
    /// Shown to the caller exactly once, never stored.
    pub plaintext: String,
    pub prefix: String,
    /// SHA-256 hex digest of `plaintext`; this is what gets stored.
    pub hash: String,
}

/// Generate a random alphanumeric secret of `len` characters.
pub fn generate_secret(len: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_api_key() -> GeneratedApiKey {
    let plaintext = generate_secret(API_KEY_LENGTH);
    GeneratedApiKey {
        prefix: api_key_prefix(&plaintext).to_string(),
        hash: hash_api_key(&plaintext),
        plaintext,
    }
}

/// SHA-256 hex digest of an API key, used both when storing and verifying.
pub fn hash_api_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

pub fn api_key_prefix(key: &str) -> &str {
    key.get(..API_KEY_PREFIX_LENGTH).unwrap_or(key)
}

pub fn generate_resume_token() -> String {
    generate_secret(RESUME_TOKEN_LENGTH)
}

/// Accept only strings that could have come from [`generate_secret`].
pub fn is_well_formed(token: &str, len: usize) -> bool {
    token.len() == len && token.chars().all(|c| c.is_ascii_alphanumeric())
}
