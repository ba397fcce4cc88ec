use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::AuthError;

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hashes with an explicit bcrypt work factor (4..=31).
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    verify(password, hash)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to verify password: {}", e)))
}
