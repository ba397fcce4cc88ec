use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;
use utoipa::ToSchema;

use playhub_core::{AppError, AuthError};
use playhub_models::auth::{
    LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest, RefreshTokenResponse,
    ValidateTokenRequest, ValidateTokenResponse,
};
use playhub_models::identity::IdentityView;

use super::service::{BasicAuth, SessionAwareAuth};
use crate::middleware::auth::{ClientContext, IdentityContext};
use crate::modules::identities::repository::IdentityRepository;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Login with email and password
///
/// The namespace (administrator or user) is resolved from the email. A session
/// is recorded for the issued token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Bad request - malformed body", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, client, dto), fields(email = %dto.email))]
pub async fn login(
    State(state): State<AppState>,
    client: ClientContext,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (outcome, session) = state
        .auth
        .login_with_session(
            &dto.email,
            &dto.password,
            dto.remember_me,
            client.device(dto.device_info),
        )
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token.token,
        namespace: outcome.identity.namespace,
        identity: outcome.identity.view(),
        expires_at: outcome.token.expires_at,
        session_id: session.id,
    }))
}

/// Exchange a valid token for a new one
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed; the old session is replaced", body = RefreshTokenResponse),
        (status = 401, description = "Invalid, malformed or expired token, or its session was revoked", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, client, dto))]
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientContext,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let (issued, session) = state
        .auth
        .refresh_with_session(&dto.token, dto.remember_me, client.device(None))
        .await?;

    Ok(Json(RefreshTokenResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        session_id: session.id,
    }))
}

/// Check a token and return its claims
#[utoipa::path(
    post,
    path = "/api/auth/validate",
    request_body = ValidateTokenRequest,
    responses(
        (status = 200, description = "Token is valid", body = ValidateTokenResponse),
        (status = 401, description = "Invalid, malformed or expired token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn validate(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ValidateTokenRequest>,
) -> Result<Json<ValidateTokenResponse>, AppError> {
    let claims = state.auth.validate(&dto.token)?;
    Ok(Json(ValidateTokenResponse::from_claims(&claims)))
}

/// Revoke the caller's current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, ctx), fields(identity = %ctx.identity))]
pub async fn logout(
    State(state): State<AppState>,
    ctx: IdentityContext,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    state.auth.logout(ctx.identity, &ctx.token).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Logged out successfully"))))
}

/// Get the caller's identity
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = IdentityView),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Identity no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, ctx), fields(identity = %ctx.identity))]
pub async fn me(
    State(state): State<AppState>,
    ctx: IdentityContext,
) -> Result<Json<IdentityView>, AppError> {
    let identity = state
        .identities
        .find_by_id(ctx.identity)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::IdentityNotFound)?;

    Ok(Json(identity.view()))
}
