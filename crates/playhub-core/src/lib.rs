//! # PlayHub Core
//!
//! Core types and utilities shared by the PlayHub crates:
//!
//! - [`errors`]: the [`AuthError`] taxonomy and the HTTP-facing [`AppError`]
//! - [`password`]: bcrypt password hashing and verification
//! - [`secrets`]: reset-token and verification-code generation, hashing and comparison
//!
//! # Example
//!
//! ```ignore
//! use playhub_core::{hash_password, verify_password, secrets};
//!
//! let hash = hash_password("secure_password")?;
//! assert!(verify_password("secure_password", &hash)?);
//!
//! let code = secrets::generate_numeric_code(6);
//! let stored = secrets::hash_secret(&code);
//! ```

pub mod errors;
pub mod password;
pub mod secrets;

// Re-export commonly used types at crate root
pub use errors::{AppError, AuthError};
pub use password::{hash_password, hash_password_with_cost, verify_password};
