//! Account creation and session maintenance against the live database.

use anyhow::{Context, bail};
use sqlx::PgPool;
use validator::ValidateEmail;

use playhub_auth::Namespace;
use playhub_config::AuthPolicyConfig;
use playhub_core::{AuthError, hash_password_with_cost};

/// Input for a new administrator or player.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub namespace: Namespace,
    pub email: String,
    pub name: String,
    pub password: String,
}

impl NewAccount {
    pub fn new(
        namespace: Namespace,
        email: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            email: email.into().trim().to_string(),
            name: name.into().trim().to_string(),
            password: password.into(),
        }
    }

    /// Checks the fields before anything touches the database.
    pub fn check(&self, policy: &AuthPolicyConfig) -> anyhow::Result<()> {
        if !self.email.validate_email() {
            bail!("'{}' is not a valid email address", self.email);
        }
        if self.name.is_empty() {
            bail!("Name must not be empty");
        }
        if self.password.chars().count() < policy.password_min_length {
            return Err(AuthError::WeakPassword {
                min_length: policy.password_min_length,
            }
            .into());
        }
        Ok(())
    }
}

fn table(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Admin => "administrators",
        Namespace::User => "users",
    }
}

/// Inserts the account and returns its id.
///
/// The email must be free in both namespaces, not just the target one.
pub async fn create_account(
    db: &PgPool,
    account: &NewAccount,
    policy: &AuthPolicyConfig,
) -> anyhow::Result<i64> {
    account.check(policy)?;

    let taken = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))
            OR EXISTS (SELECT 1 FROM administrators WHERE LOWER(email) = LOWER($1))
        "#,
    )
    .bind(&account.email)
    .fetch_one(db)
    .await
    .context("Failed to check for an existing account")?;

    if taken {
        return Err(AuthError::EmailConflict.into());
    }

    let password_hash = hash_password_with_cost(&account.password, policy.bcrypt_cost)?;

    let sql = format!(
        "INSERT INTO {} (email, name, password) VALUES ($1, $2, $3) RETURNING id",
        table(account.namespace)
    );
    let id = sqlx::query_scalar::<_, i64>(&sql)
        .bind(&account.email)
        .bind(&account.name)
        .bind(&password_hash)
        .fetch_one(db)
        .await
        .context("Failed to insert account")?;

    Ok(id)
}

/// Deletes sessions whose expiry has passed. Returns how many were removed.
pub async fn sweep_expired_sessions(db: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}
