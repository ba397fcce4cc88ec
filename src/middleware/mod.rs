//! Request extractors.
//!
//! - [`auth::IdentityContext`]: the authenticated caller, resolved from the
//!   bearer token and its session
//! - [`auth::ClientContext`]: caller IP and user agent for labelling sessions
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::IdentityContext;
//!
//! async fn whoami(ctx: IdentityContext) -> String {
//!     ctx.identity.to_string()
//! }
//! ```

pub mod auth;
