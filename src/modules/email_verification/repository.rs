use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use playhub_auth::IdentityRef;
use playhub_models::email_verification::{EmailVerificationCode, NewEmailVerificationCode};

#[async_trait]
pub trait EmailVerificationRepository: Send + Sync {
    async fn create(
        &self,
        new: NewEmailVerificationCode,
    ) -> Result<EmailVerificationCode, sqlx::Error>;

    /// Most recent code for `(identity, email)` whose hash equals `code_hash`.
    async fn find_latest(
        &self,
        identity: IdentityRef,
        email: &str,
        code_hash: &str,
    ) -> Result<Option<EmailVerificationCode>, sqlx::Error>;

    /// Deletes every pending code for `(identity, email)`.
    async fn delete_for(&self, identity: IdentityRef, email: &str) -> Result<u64, sqlx::Error>;

    /// Returns whether a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error>;
}

const CODE_COLUMNS: &str =
    "id, identity_id, identity_kind, email, code_hash, expires_at, created_at";

#[derive(Clone)]
pub struct PgEmailVerificationRepository {
    db: PgPool,
}

impl PgEmailVerificationRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EmailVerificationRepository for PgEmailVerificationRepository {
    async fn create(
        &self,
        new: NewEmailVerificationCode,
    ) -> Result<EmailVerificationCode, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO email_verification_codes
                (identity_id, identity_kind, email, code_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CODE_COLUMNS
        );
        sqlx::query_as::<_, EmailVerificationCode>(&sql)
            .bind(new.identity.id)
            .bind(new.identity.namespace.as_str())
            .bind(&new.email)
            .bind(&new.code_hash)
            .bind(new.expires_at)
            .fetch_one(&self.db)
            .await
    }

    async fn find_latest(
        &self,
        identity: IdentityRef,
        email: &str,
        code_hash: &str,
    ) -> Result<Option<EmailVerificationCode>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM email_verification_codes
            WHERE identity_id = $1 AND identity_kind = $2
              AND LOWER(email) = LOWER($3) AND code_hash = $4
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            CODE_COLUMNS
        );
        sqlx::query_as::<_, EmailVerificationCode>(&sql)
            .bind(identity.id)
            .bind(identity.namespace.as_str())
            .bind(email)
            .bind(code_hash)
            .fetch_optional(&self.db)
            .await
    }

    async fn delete_for(&self, identity: IdentityRef, email: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM email_verification_codes
            WHERE identity_id = $1 AND identity_kind = $2 AND LOWER(email) = LOWER($3)
            "#,
        )
        .bind(identity.id)
        .bind(identity.namespace.as_str())
        .bind(email)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM email_verification_codes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
