use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::errors::{Error, Result};

/// Argon2id tuned for interactive requests: small memory cost, one pass.
pub fn password_hasher() -> Result<Argon2<'static>> {
    const MEMORY_COST_KIB: u32 = 768;
    const ITERATIONS: u32 = 1;
    const PARALLELISM: u32 = 1;
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .map_err(|e| Error::internal(format!("invalid Argon2 parameters: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Produce a PHC-encoded verifier for `password`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    password_hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("failed to hash password: {}", e)))
}

/// Check `password` against a stored verifier. A malformed verifier is an
/// internal error, a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool> {
    let parsed = PasswordHash::new(encoded)
        .map_err(|e| Error::internal(format!("stored password hash is invalid: {}", e)))?;
    Ok(password_hasher()?.verify_password(password.as_bytes(), &parsed).is_ok())
}
