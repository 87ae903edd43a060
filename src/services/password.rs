//! Password hashing and verification. Plaintext never reaches a log line.

use crate::errors::{AuthError, AuthResult};

pub fn hash(plain: &str) -> AuthResult<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// A malformed stored hash counts as a non-match, not an error; the caller
/// treats both the same way.
pub fn verify(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}
