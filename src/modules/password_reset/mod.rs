pub mod controller;
pub mod repository;
pub mod router;
pub mod service;

pub use router::init_password_reset_router;
pub use service::PasswordResetService;
