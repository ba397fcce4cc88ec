//! # PlayHub Models
//!
//! Domain models and DTOs for the PlayHub authentication API.
//!
//! # Modules
//!
//! - [`identity`]: administrators and standard users
//! - [`auth`]: login, refresh and validate DTOs
//! - [`session`]: session records and session-management DTOs
//! - [`password_reset`]: reset tokens and the reset flow DTOs
//! - [`email_verification`]: email-change codes and DTOs

pub mod auth;
pub mod email_verification;
pub mod identity;
pub mod password_reset;
pub mod session;

pub use auth::{
    LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest, RefreshTokenResponse,
    ValidateTokenRequest, ValidateTokenResponse,
};
pub use email_verification::{
    EmailVerificationCode, NewEmailVerificationCode, SendEmailVerificationRequest,
    SendEmailVerificationResponse, VerifyEmailCodeRequest, VerifyEmailCodeResponse,
};
pub use identity::{Identity, IdentityView, NewIdentity};
pub use password_reset::{
    ForgotPasswordRequest, NewPasswordResetToken, PasswordResetToken, ResetPasswordRequest,
    ResetTokenStatusResponse, ValidateResetTokenQuery,
};
pub use session::{
    NewSession, RevokeSessionsResponse, Session, SessionListResponse, SessionView,
};
