//! Authentication DTOs.
//!
//! Login, refresh, validate and logout requests and responses. Login takes no
//! namespace: the server resolves it from the email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use playhub_auth::{Claims, Namespace};

use crate::identity::IdentityView;

/// Login request with email and password.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    #[schema(example = "player@example.com")]
    pub email: String,
    #[validate(length(min = 1))]
    #[schema(example = "password123")]
    pub password: String,
    /// Issue a long-lived token.
    #[serde(default)]
    pub remember_me: bool,
    #[validate(length(max = 255))]
    #[schema(example = "Chrome on Windows")]
    pub device_info: Option<String>,
}

/// Successful login. `namespace` tells the client which identity kind it is.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub namespace: Namespace,
    pub identity: IdentityView,
    pub expires_at: DateTime<Utc>,
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub session_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ValidateTokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

/// Decoded view of a token that passed validation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub id: i64,
    pub namespace: Namespace,
    pub email: String,
    pub name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ValidateTokenResponse {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            valid: true,
            id: claims.uid,
            namespace: claims.ns,
            email: claims.email.clone(),
            name: claims.name.clone(),
            issued_at: DateTime::from_timestamp(claims.iat, 0).unwrap_or_default(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_remember_me_defaults_false() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"secret"}"#).unwrap();
        assert!(!request.remember_me);
        assert!(request.device_info.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_request_rejects_empty_password() {
        let request = LoginRequest {
            email: "a@b.com".to_string(),
            password: String::new(),
            remember_me: false,
            device_info: None,
        };
        assert!(request.validate().is_err());
    }
}
