use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use playhub_auth::Namespace;
use playhub_models::auth::{
    LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest, RefreshTokenResponse,
    ValidateTokenRequest, ValidateTokenResponse,
};
use playhub_models::email_verification::{
    SendEmailVerificationRequest, SendEmailVerificationResponse, VerifyEmailCodeRequest,
    VerifyEmailCodeResponse,
};
use playhub_models::identity::IdentityView;
use playhub_models::password_reset::{
    ForgotPasswordRequest, ResetPasswordRequest, ResetTokenStatusResponse,
};
use playhub_models::session::{RevokeSessionsResponse, SessionListResponse, SessionView};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::auth::controller::validate,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::me,
        crate::modules::password_reset::controller::forgot_password,
        crate::modules::password_reset::controller::reset_password,
        crate::modules::password_reset::controller::validate_reset_token,
        crate::modules::sessions::controller::list_sessions,
        crate::modules::sessions::controller::revoke_session,
        crate::modules::sessions::controller::revoke_other_sessions,
        crate::modules::sessions::controller::revoke_all_sessions,
        crate::modules::email_verification::controller::send_email_verification,
        crate::modules::email_verification::controller::verify_email_code,
    ),
    components(
        schemas(
            Namespace,
            IdentityView,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            RefreshTokenResponse,
            ValidateTokenRequest,
            ValidateTokenResponse,
            MessageResponse,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            ResetTokenStatusResponse,
            SessionView,
            SessionListResponse,
            RevokeSessionsResponse,
            SendEmailVerificationRequest,
            SendEmailVerificationResponse,
            VerifyEmailCodeRequest,
            VerifyEmailCodeResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and validation"),
        (name = "Password Reset", description = "Forgotten-password flow"),
        (name = "Sessions", description = "Active session management"),
        (name = "Account", description = "Email-change verification")
    ),
    info(
        title = "PlayHub Auth API",
        version = "0.1.0",
        description = "Authentication and credential lifecycle for PlayHub administrators and players.",
        contact(
            name = "API Support",
            email = "support@playhub.gg"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
