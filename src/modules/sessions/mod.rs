pub mod controller;
pub mod repository;
pub mod router;
pub mod service;

pub use router::init_sessions_router;
pub use service::{DeviceContext, SessionService};
