//! # PlayHub DB
//!
//! Connection pool and embedded migrations.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `DATABASE_ACQUIRE_TIMEOUT_SECS`: how long a request waits for a
//!   connection (default: 5)
//!
//! ```ignore
//! let pool = playhub_db::init_db_pool().await?;
//! playhub_db::run_migrations(&pool).await?;
//! ```

use std::env;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use sqlx::PgPool;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL must be set")]
    MissingUrl,

    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbSettings {
    pub fn from_env() -> Result<Self, DbError> {
        let url = env::var("DATABASE_URL").map_err(|_| DbError::MissingUrl)?;
        Ok(Self::from_parts(
            url,
            env::var("DATABASE_MAX_CONNECTIONS").ok().as_deref(),
            env::var("DATABASE_ACQUIRE_TIMEOUT_SECS").ok().as_deref(),
        ))
    }

    /// Unparseable or zero values fall back to the defaults.
    fn from_parts(url: String, max_connections: Option<&str>, acquire_secs: Option<&str>) -> Self {
        let max_connections = max_connections
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(10);
        let acquire_secs = acquire_secs
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5);

        Self {
            url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_secs),
        }
    }
}

/// Connects using [`DbSettings::from_env`].
pub async fn init_db_pool() -> Result<PgPool, DbError> {
    connect(&DbSettings::from_env()?).await
}

pub async fn connect(settings: &DbSettings) -> Result<PgPool, DbError> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(&settings.url)
        .await
        .map_err(DbError::Connect)
}

/// Applies `migrations/` from the workspace root.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
