use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use playhub_auth::IdentityRef;
use playhub_models::password_reset::{NewPasswordResetToken, PasswordResetToken};

#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create(&self, new: NewPasswordResetToken) -> Result<PasswordResetToken, sqlx::Error>;

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, sqlx::Error>;

    /// Sets `used_at` if the token is still unused. Returns whether this call consumed it.
    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, sqlx::Error>;

    /// Marks every unused token of `identity` as used.
    async fn invalidate_unused(
        &self,
        identity: IdentityRef,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error>;
}

const TOKEN_COLUMNS: &str = "id, identity_id, identity_kind, token, expires_at, used_at, created_at";

#[derive(Clone)]
pub struct PgPasswordResetRepository {
    db: PgPool,
}

impl PgPasswordResetRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PasswordResetRepository for PgPasswordResetRepository {
    async fn create(&self, new: NewPasswordResetToken) -> Result<PasswordResetToken, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO password_reset_tokens (identity_id, identity_kind, token, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TOKEN_COLUMNS
        );
        sqlx::query_as::<_, PasswordResetToken>(&sql)
            .bind(new.identity.id)
            .bind(new.identity.namespace.as_str())
            .bind(&new.token)
            .bind(new.expires_at)
            .fetch_one(&self.db)
            .await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM password_reset_tokens WHERE token = $1",
            TOKEN_COLUMNS
        );
        sqlx::query_as::<_, PasswordResetToken>(&sql)
            .bind(token)
            .fetch_optional(&self.db)
            .await
    }

    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = $1 WHERE id = $2 AND used_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn invalidate_unused(
        &self,
        identity: IdentityRef,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens SET used_at = $1
            WHERE identity_id = $2 AND identity_kind = $3 AND used_at IS NULL
            "#,
        )
        .bind(at)
        .bind(identity.id)
        .bind(identity.namespace.as_str())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
