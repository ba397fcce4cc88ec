use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use uuid::Uuid;

use playhub_auth::{Claims, IdentityRef};
use playhub_core::{AppError, AuthError};

use crate::modules::auth::service::BasicAuth;
use crate::modules::sessions::service::DeviceContext;
use crate::state::AppState;

/// The authenticated caller.
///
/// Extraction validates the bearer token, requires a live session bound to it
/// and records activity on that session.
#[derive(Debug, Clone)]
pub struct IdentityContext {
    pub identity: IdentityRef,
    pub claims: Claims,
    pub token: String,
    pub session_id: Uuid,
}

impl FromRequestParts<AppState> for IdentityContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.auth.validate(token)?;
        let identity = claims.identity();

        let session = state
            .sessions()
            .current_session(identity, token)
            .await?
            .ok_or(AuthError::SessionRevoked)?;
        state.sessions().touch(session.id).await;

        Ok(IdentityContext {
            identity,
            claims,
            token: token.to_string(),
            session_id: session.id,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))
}

/// Network details of the caller, used to label new sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientContext {
    pub fn device(&self, device_info: Option<String>) -> DeviceContext {
        DeviceContext {
            device_info,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(ClientContext {
            ip_address: forwarded_ip(&parts.headers).or(peer),
            user_agent: header_value(&parts.headers, header::USER_AGENT.as_str()),
        })
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    header_value(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .or_else(|| header_value(headers, "x-real-ip"))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
