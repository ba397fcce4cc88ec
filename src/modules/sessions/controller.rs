use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use playhub_core::AppError;
use playhub_models::auth::MessageResponse;
use playhub_models::session::{RevokeSessionsResponse, SessionListResponse};

use crate::middleware::auth::IdentityContext;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::service::SessionAwareAuth;
use crate::state::AppState;

/// List the caller's active sessions
#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Active sessions, most recently used first", body = SessionListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
#[instrument(skip(state, ctx), fields(identity = %ctx.identity))]
pub async fn list_sessions(
    State(state): State<AppState>,
    ctx: IdentityContext,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.auth.list_sessions(ctx.identity, &ctx.token).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// Revoke one of the caller's sessions
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
#[instrument(skip(state, ctx), fields(identity = %ctx.identity))]
pub async fn revoke_session(
    State(state): State<AppState>,
    ctx: IdentityContext,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.revoke_session(ctx.identity, id).await?;
    Ok(Json(MessageResponse::new("Session revoked")))
}

/// Revoke every session except the current one
#[utoipa::path(
    post,
    path = "/api/sessions/revoke-others",
    responses(
        (status = 200, description = "Other sessions revoked", body = RevokeSessionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
#[instrument(skip(state, ctx), fields(identity = %ctx.identity))]
pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    ctx: IdentityContext,
) -> Result<Json<RevokeSessionsResponse>, AppError> {
    let revoked = state
        .auth
        .revoke_other_sessions(ctx.identity, &ctx.token)
        .await?;
    Ok(Json(RevokeSessionsResponse { revoked }))
}

/// Revoke every session, including the current one
#[utoipa::path(
    post,
    path = "/api/sessions/revoke-all",
    responses(
        (status = 200, description = "All sessions revoked", body = RevokeSessionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sessions"
)]
#[instrument(skip(state, ctx), fields(identity = %ctx.identity))]
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    ctx: IdentityContext,
) -> Result<Json<RevokeSessionsResponse>, AppError> {
    let revoked = state.auth.revoke_all_sessions(ctx.identity).await?;
    Ok(Json(RevokeSessionsResponse { revoked }))
}
