//! One-time invitation tokens.
//!
//! The plaintext token is handed to the registrant once; only its SHA-256
//! fingerprint is ever persisted, so a database read cannot be replayed
//! against the activation endpoint.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Freshly generated invitation secret.
pub fn generate_plaintext() -> String {
    Uuid::new_v4().to_string()
}

/// Deterministic lowercase hex SHA-256 of the plaintext token.
pub fn fingerprint(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}
