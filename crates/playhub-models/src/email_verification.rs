//! Email-change verification models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use playhub_auth::{IdentityRef, Namespace};

/// A pending email change. Only the hash of the code is stored; the row is
/// deleted on successful confirmation.
#[derive(Debug, Clone, FromRow)]
pub struct EmailVerificationCode {
    pub id: Uuid,
    pub identity_id: i64,
    #[sqlx(try_from = "String")]
    pub identity_kind: Namespace,
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EmailVerificationCode {
    pub fn identity(&self) -> IdentityRef {
        IdentityRef::new(self.identity_id, self.identity_kind)
    }
}

#[derive(Debug, Clone)]
pub struct NewEmailVerificationCode {
    pub identity: IdentityRef,
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SendEmailVerificationRequest {
    #[validate(email)]
    #[schema(example = "new-address@example.com")]
    pub new_email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SendEmailVerificationResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
    /// Only present when the server runs with `EXPOSE_VERIFICATION_CODE=true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailCodeRequest {
    #[validate(email)]
    #[schema(example = "new-address@example.com")]
    pub new_email: String,
    #[validate(length(min = 1))]
    #[schema(example = "042917")]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyEmailCodeResponse {
    pub verified: bool,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_omitted_unless_exposed() {
        let response = SendEmailVerificationResponse {
            message: "sent".to_string(),
            expires_at: Utc::now(),
            code: None,
        };
        let serialized = serde_json::to_string(&response).unwrap();
        assert!(!serialized.contains("code"));
    }

    #[test]
    fn test_send_request_rejects_bad_email() {
        let request = SendEmailVerificationRequest {
            new_email: "nope".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
