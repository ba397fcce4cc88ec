use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use playhub_auth::IdentityRef;
use playhub_models::session::{NewSession, Session};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, new: NewSession) -> Result<Session, sqlx::Error>;

    /// Active, unexpired sessions of `identity`, most recent activity first.
    async fn list_active(
        &self,
        identity: IdentityRef,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, sqlx::Error>;

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error>;

    /// Deactivates one session owned by `identity`, active or not. Returns the
    /// number of rows matched, so zero means the caller does not own it.
    async fn deactivate(&self, id: Uuid, identity: IdentityRef) -> Result<u64, sqlx::Error>;

    /// Deactivates every active session of `identity`, except `keep` when given.
    async fn deactivate_all(
        &self,
        identity: IdentityRef,
        keep: Option<Uuid>,
    ) -> Result<u64, sqlx::Error>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error>;
}

const SESSION_COLUMNS: &str = r#"
    id, identity_id, identity_kind, token, device_info, ip_address, user_agent,
    is_active, last_activity_at, created_at, expires_at
"#;

#[derive(Clone)]
pub struct PgSessionRepository {
    db: PgPool,
}

impl PgSessionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, new: NewSession) -> Result<Session, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO sessions
                (identity_id, identity_kind, token, device_info, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        );
        sqlx::query_as::<_, Session>(&sql)
            .bind(new.identity.id)
            .bind(new.identity.namespace.as_str())
            .bind(&new.token)
            .bind(&new.device_info)
            .bind(&new.ip_address)
            .bind(&new.user_agent)
            .bind(new.expires_at)
            .fetch_one(&self.db)
            .await
    }

    async fn list_active(
        &self,
        identity: IdentityRef,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sessions
            WHERE identity_id = $1 AND identity_kind = $2
              AND is_active = TRUE AND expires_at > $3
            ORDER BY last_activity_at DESC
            "#,
            SESSION_COLUMNS
        );
        sqlx::query_as::<_, Session>(&sql)
            .bind(identity.id)
            .bind(identity.namespace.as_str())
            .bind(now)
            .fetch_all(&self.db)
            .await
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET last_activity_at = $1 WHERE id = $2")
            .bind(at)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid, identity: IdentityRef) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET is_active = FALSE
            WHERE id = $1 AND identity_id = $2 AND identity_kind = $3
            "#,
        )
        .bind(id)
        .bind(identity.id)
        .bind(identity.namespace.as_str())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    async fn deactivate_all(
        &self,
        identity: IdentityRef,
        keep: Option<Uuid>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET is_active = FALSE
            WHERE identity_id = $1 AND identity_kind = $2 AND is_active = TRUE
              AND ($3::uuid IS NULL OR id <> $3)
            "#,
        )
        .bind(identity.id)
        .bind(identity.namespace.as_str())
        .bind(keep)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
