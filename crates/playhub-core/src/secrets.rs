//! Generation and comparison of short-lived secrets.
//!
//! Reset tokens are random bytes rendered as hex, verification codes are
//! zero-padded decimal strings. Neither is ever compared with `==`: codes are
//! looked up by their SHA-256 digest and tokens are compared digest-to-digest.

use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes behind a password-reset token.
pub const RESET_TOKEN_BYTES: usize = 32;

/// Digits in an email verification code.
pub const VERIFICATION_CODE_DIGITS: u32 = 6;

/// Returns a hex-encoded token built from [`RESET_TOKEN_BYTES`] random bytes.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Returns a zero-padded decimal code with `digits` digits.
pub fn generate_numeric_code(digits: u32) -> String {
    let upper = 10u64.pow(digits);
    let value = rand::thread_rng().gen_range(0..upper);
    format!("{:0width$}", value, width = digits as usize)
}

/// SHA-256 of `secret`, hex-encoded.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Compares two secrets without short-circuiting on the first differing byte.
pub fn secrets_match(left: &str, right: &str) -> bool {
    let left = Sha256::digest(left.as_bytes());
    let right = Sha256::digest(right.as_bytes());
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
