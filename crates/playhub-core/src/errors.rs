//! Error types shared across PlayHub.
//!
//! [`AuthError`] is the domain taxonomy returned by the authentication flows.
//! [`AppError`] is the HTTP-facing error: a status code plus an error message,
//! rendered as `{"error": "..."}`.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures produced by the credential-lifecycle flows.
///
/// Input problems (`PasswordMismatch`, `WeakPassword`) carry enough detail to be
/// corrected. Existence and ownership problems stay generic so responses do not
/// reveal which check failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Session not found")]
    SessionNotFound,

    /// The token is well formed but its session is no longer live.
    #[error("Session has been revoked or has expired")]
    SessionRevoked,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredResetToken,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min_length} characters long")]
    WeakPassword { min_length: usize },

    #[error("No account found with that email address")]
    EmailNotFound,

    #[error("Email address is already in use")]
    EmailConflict,

    #[error("New email address is the same as the current one")]
    EmailUnchanged,

    #[error("Invalid or expired verification code")]
    VerificationCodeInvalid,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::MalformedToken
            | AuthError::SessionRevoked => StatusCode::UNAUTHORIZED,
            AuthError::SessionNotFound
            | AuthError::EmailNotFound
            | AuthError::IdentityNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidOrExpiredResetToken
            | AuthError::PasswordMismatch
            | AuthError::WeakPassword { .. }
            | AuthError::EmailUnchanged
            | AuthError::VerificationCodeInvalid => StatusCode::BAD_REQUEST,
            AuthError::EmailConflict => StatusCode::CONFLICT,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Database(_) | AuthError::Internal(_))
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message.into()))
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let status = err.status();
        if err.is_internal() {
            // Store and internal details stay in the logs, never in the body.
            tracing::error!(error = %err, "Internal error while handling auth request");
            return AppError::new(status, anyhow::anyhow!("Internal server error"));
        }
        AppError::new(status, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}
