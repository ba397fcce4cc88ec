use axum::Json;
use axum::extract::State;
use tracing::instrument;

use playhub_core::AppError;
use playhub_models::email_verification::{
    SendEmailVerificationRequest, SendEmailVerificationResponse, VerifyEmailCodeRequest,
    VerifyEmailCodeResponse,
};

use crate::middleware::auth::IdentityContext;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Send a verification code to a new email address
#[utoipa::path(
    post,
    path = "/api/account/email/verification",
    request_body = SendEmailVerificationRequest,
    responses(
        (status = 200, description = "Verification code sent", body = SendEmailVerificationResponse),
        (status = 400, description = "Email unchanged", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
#[instrument(skip(state, ctx, dto), fields(identity = %ctx.identity))]
pub async fn send_email_verification(
    State(state): State<AppState>,
    ctx: IdentityContext,
    ValidatedJson(dto): ValidatedJson<SendEmailVerificationRequest>,
) -> Result<Json<SendEmailVerificationResponse>, AppError> {
    let issued = state
        .email_verification
        .request_change(ctx.identity, &dto.new_email)
        .await?;

    let code = state
        .config
        .policy
        .expose_verification_code
        .then_some(issued.code);

    Ok(Json(SendEmailVerificationResponse {
        message: format!("A verification code has been sent to {}", dto.new_email),
        expires_at: issued.expires_at,
        code,
    }))
}

/// Confirm an email change with the received code
#[utoipa::path(
    post,
    path = "/api/account/email/verify",
    request_body = VerifyEmailCodeRequest,
    responses(
        (status = 200, description = "Email address updated", body = VerifyEmailCodeResponse),
        (status = 400, description = "Invalid or expired verification code", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
#[instrument(skip(state, ctx, dto), fields(identity = %ctx.identity))]
pub async fn verify_email_code(
    State(state): State<AppState>,
    ctx: IdentityContext,
    ValidatedJson(dto): ValidatedJson<VerifyEmailCodeRequest>,
) -> Result<Json<VerifyEmailCodeResponse>, AppError> {
    state
        .email_verification
        .confirm(ctx.identity, &dto.new_email, &dto.code)
        .await?;

    Ok(Json(VerifyEmailCodeResponse {
        verified: true,
        email: dto.new_email,
    }))
}
