//! # PlayHub CLI
//!
//! Account administration for PlayHub.
//!
//! Accounts are never created over HTTP; operators create administrators and
//! players with this crate's binary.
//!
//! ## Usage
//!
//! ```ignore
//! use playhub_cli::accounts::{NewAccount, create_account};
//!
//! let account = NewAccount::new(Namespace::Admin, "ops@playhub.gg", "Ops", "s3cret-pass");
//! let id = create_account(&pool, &account, &AuthPolicyConfig::from_env()).await?;
//! ```

pub mod accounts;
