use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use playhub_auth::{IdentityRef, Namespace};
use playhub_models::identity::{Identity, NewIdentity};

/// Storage for both identity namespaces.
///
/// Every lookup names its namespace explicitly; the two tables are never
/// queried as one except by [`IdentityRepository::email_exists`].
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn find_by_email(
        &self,
        namespace: Namespace,
        email: &str,
    ) -> Result<Option<Identity>, sqlx::Error>;

    async fn find_by_id(&self, identity: IdentityRef) -> Result<Option<Identity>, sqlx::Error>;

    /// True when any identity in either namespace holds `email`.
    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error>;

    async fn create(&self, new: NewIdentity) -> Result<Identity, sqlx::Error>;

    async fn update_password(
        &self,
        identity: IdentityRef,
        password_hash: &str,
    ) -> Result<(), sqlx::Error>;

    async fn update_email(&self, identity: IdentityRef, email: &str) -> Result<(), sqlx::Error>;

    async fn record_login(
        &self,
        identity: IdentityRef,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;
}

fn table(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Admin => "administrators",
        Namespace::User => "users",
    }
}

#[derive(Debug, FromRow)]
struct IdentityRow {
    id: i64,
    email: String,
    name: String,
    password: String,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl IdentityRow {
    fn into_identity(self, namespace: Namespace) -> Identity {
        Identity {
            id: self.id,
            namespace,
            email: self.email,
            name: self.name,
            password_hash: self.password,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        }
    }
}

const IDENTITY_COLUMNS: &str = "id, email, name, password, last_login_at, created_at";

#[derive(Clone)]
pub struct PgIdentityRepository {
    db: PgPool,
}

impl PgIdentityRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityRepository for PgIdentityRepository {
    async fn find_by_email(
        &self,
        namespace: Namespace,
        email: &str,
    ) -> Result<Option<Identity>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM {} WHERE LOWER(email) = LOWER($1)",
            IDENTITY_COLUMNS,
            table(namespace)
        );
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|r| r.into_identity(namespace)))
    }

    async fn find_by_id(&self, identity: IdentityRef) -> Result<Option<Identity>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            IDENTITY_COLUMNS,
            table(identity.namespace)
        );
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(identity.id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|r| r.into_identity(identity.namespace)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))
                OR EXISTS (SELECT 1 FROM administrators WHERE LOWER(email) = LOWER($1))
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, sqlx::Error> {
        let sql = format!(
            "INSERT INTO {} (email, name, password) VALUES ($1, $2, $3) RETURNING {}",
            table(new.namespace),
            IDENTITY_COLUMNS
        );
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(&new.email)
            .bind(&new.name)
            .bind(&new.password_hash)
            .fetch_one(&self.db)
            .await?;

        Ok(row.into_identity(new.namespace))
    }

    async fn update_password(
        &self,
        identity: IdentityRef,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        let sql = format!(
            "UPDATE {} SET password = $1, updated_at = NOW() WHERE id = $2",
            table(identity.namespace)
        );
        sqlx::query(&sql)
            .bind(password_hash)
            .bind(identity.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn update_email(&self, identity: IdentityRef, email: &str) -> Result<(), sqlx::Error> {
        let sql = format!(
            "UPDATE {} SET email = $1, updated_at = NOW() WHERE id = $2",
            table(identity.namespace)
        );
        sqlx::query(&sql)
            .bind(email)
            .bind(identity.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn record_login(
        &self,
        identity: IdentityRef,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let sql = format!(
            "UPDATE {} SET last_login_at = $1 WHERE id = $2",
            table(identity.namespace)
        );
        sqlx::query(&sql)
            .bind(at)
            .bind(identity.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
