use crate::env;

const SECONDS_PER_DAY: i64 = 86_400;

/// Signing and lifetime settings for bearer tokens.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Value of the `iss` claim; tokens with any other issuer are rejected.
    pub issuer: String,
    /// Lifetime of a standard token, in seconds.
    pub expiry_seconds: i64,
    /// Lifetime of a "remember me" token, in days.
    pub remember_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            issuer: "playhub".to_string(),
            expiry_seconds: SECONDS_PER_DAY,
            remember_days: 7,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: env::string_or("JWT_SECRET", defaults.secret),
            issuer: env::string_or("JWT_ISSUER", defaults.issuer),
            expiry_seconds: env::parsed_or("JWT_EXPIRY_SECONDS", defaults.expiry_seconds),
            remember_days: env::parsed_or("JWT_REMEMBER_DAYS", defaults.remember_days),
        }
    }

    /// Token lifetime in seconds for the given remember-me choice.
    pub fn lifetime_seconds(&self, remember: bool) -> i64 {
        if remember {
            self.remember_days * SECONDS_PER_DAY
        } else {
            self.expiry_seconds
        }
    }
}
