pub mod auth;
pub mod email_verification;
pub mod identities;
pub mod password_reset;
pub mod sessions;
