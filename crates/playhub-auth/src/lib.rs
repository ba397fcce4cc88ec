//! # PlayHub Auth
//!
//! Identity namespaces and bearer tokens for PlayHub.
//!
//! - [`namespace`]: the two disjoint identity namespaces and [`IdentityRef`]
//! - [`claims`]: the claim set carried by every bearer token
//! - [`jwt`]: [`TokenIssuer`], which issues, validates and refreshes tokens
//!
//! # Example
//!
//! ```ignore
//! use playhub_auth::{IdentityRef, Namespace, TokenIssuer};
//! use playhub_config::JwtConfig;
//!
//! let issuer = TokenIssuer::new(JwtConfig::from_env());
//! let issued = issuer.issue(IdentityRef::new(1, Namespace::Admin), "ops@x.com", "Ops", false)?;
//! let claims = issuer.validate(&issued.token)?;
//! assert_eq!(claims.identity().namespace, Namespace::Admin);
//! ```

pub mod claims;
pub mod jwt;
pub mod namespace;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use jwt::{IssuedToken, TokenIssuer};
pub use namespace::{IdentityRef, Namespace, UnknownNamespace};
