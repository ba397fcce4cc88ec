pub mod repository;

pub use repository::{IdentityRepository, PgIdentityRepository};
