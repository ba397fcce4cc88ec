//! Shared utilities.
//!
//! - [`notifier`]: the notification dispatcher used by the reset and
//!   email-change flows

pub mod notifier;
