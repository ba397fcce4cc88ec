//! # PlayHub Config
//!
//! Configuration types, each loaded from environment variables with a
//! development-friendly default for anything unset:
//!
//! - [`jwt`]: bearer-token signing and lifetimes
//! - [`auth`]: reset-token / verification-code lifetimes and password policy
//! - [`cors`]: allowed origins
//! - [`email`]: SMTP settings for the notification dispatcher
//!
//! # Example
//!
//! ```ignore
//! use playhub_config::{AuthPolicyConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let policy = AuthPolicyConfig::from_env();
//! ```

pub mod auth;
pub mod cors;
pub mod email;
mod env;
pub mod jwt;

pub use auth::AuthPolicyConfig;
pub use cors::CorsConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
