//! Password-reset models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use playhub_auth::{IdentityRef, Namespace};

/// A single-use reset token. Consumed by setting `used_at`.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub identity_id: i64,
    #[sqlx(try_from = "String")]
    pub identity_kind: Namespace,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn identity(&self) -> IdentityRef {
        IdentityRef::new(self.identity_id, self.identity_kind)
    }

    /// Unused and not yet expired.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewPasswordResetToken {
    pub identity: IdentityRef,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Starts a password reset for whichever identity owns `email`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    #[schema(example = "player@example.com")]
    pub email: String,
}

/// Completes a password reset.
///
/// Password strength is checked by the reset flow itself so the caller gets
/// the specific failure rather than a generic validation error.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(email)]
    #[schema(example = "player@example.com")]
    pub email: String,
    #[schema(example = "newPassword123")]
    pub new_password: String,
    #[schema(example = "newPassword123")]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct ValidateResetTokenQuery {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResetTokenStatusResponse {
    pub valid: bool,
    pub expires_at: DateTime<Utc>,
}
