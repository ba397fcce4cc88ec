use axum::Json;
use axum::extract::State;
use tracing::instrument;

use playhub_core::AppError;
use playhub_models::auth::MessageResponse;
use playhub_models::password_reset::{
    ForgotPasswordRequest, ResetPasswordRequest, ResetTokenStatusResponse,
    ValidateResetTokenQuery,
};

use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

/// Request a password reset link
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Password reset link sent", body = MessageResponse),
        (status = 404, description = "No account uses this email", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Password Reset"
)]
#[instrument(skip(state, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.password_reset.initiate(&dto.email).await?;
    Ok(Json(MessageResponse::new(
        "A password reset link has been sent to your email address.",
    )))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset successful", body = MessageResponse),
        (status = 400, description = "Invalid or expired token, mismatched or weak password", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Password Reset"
)]
#[instrument(skip(state, dto))]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .password_reset
        .complete(
            &dto.token,
            &dto.email,
            &dto.new_password,
            &dto.confirm_password,
        )
        .await?;

    Ok(Json(MessageResponse::new(
        "Password has been reset successfully. You can now log in with your new password.",
    )))
}

/// Check whether a reset token can still be used
#[utoipa::path(
    get,
    path = "/api/auth/reset-password/validate",
    params(ValidateResetTokenQuery),
    responses(
        (status = 200, description = "Token is usable", body = ResetTokenStatusResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "Password Reset"
)]
#[instrument(skip(state, query))]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ValidateResetTokenQuery>,
) -> Result<Json<ResetTokenStatusResponse>, AppError> {
    let token = state.password_reset.validate(&query.token).await?;
    Ok(Json(ResetTokenStatusResponse {
        valid: true,
        expires_at: token.expires_at,
    }))
}
