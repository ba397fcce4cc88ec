use crate::env;

/// Lifetimes and thresholds for the credential-lifecycle flows.
#[derive(Clone, Debug)]
pub struct AuthPolicyConfig {
    pub password_reset_ttl_minutes: i64,
    pub email_code_ttl_minutes: i64,
    pub password_min_length: usize,
    /// bcrypt work factor for newly stored passwords.
    pub bcrypt_cost: u32,
    /// How often the server deletes expired sessions.
    pub session_sweep_interval_seconds: u64,
    /// Development aid: echo the email verification code in the HTTP response.
    /// Must stay off in production.
    pub expose_verification_code: bool,
}

impl Default for AuthPolicyConfig {
    fn default() -> Self {
        Self {
            password_reset_ttl_minutes: 15,
            email_code_ttl_minutes: 10,
            password_min_length: 6,
            bcrypt_cost: 12,
            session_sweep_interval_seconds: 3600,
            expose_verification_code: false,
        }
    }
}

impl AuthPolicyConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            password_reset_ttl_minutes: env::parsed_or(
                "PASSWORD_RESET_TTL_MINUTES",
                defaults.password_reset_ttl_minutes,
            ),
            email_code_ttl_minutes: env::parsed_or(
                "EMAIL_CODE_TTL_MINUTES",
                defaults.email_code_ttl_minutes,
            ),
            password_min_length: env::parsed_or(
                "PASSWORD_MIN_LENGTH",
                defaults.password_min_length,
            ),
            bcrypt_cost: env::parsed_or("BCRYPT_COST", defaults.bcrypt_cost),
            session_sweep_interval_seconds: env::parsed_or(
                "SESSION_SWEEP_INTERVAL_SECONDS",
                defaults.session_sweep_interval_seconds,
            ),
            expose_verification_code: env::flag_or(
                "EXPOSE_VERIFICATION_CODE",
                defaults.expose_verification_code,
            ),
        }
    }
}
