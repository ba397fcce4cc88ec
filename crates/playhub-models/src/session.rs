//! Session models and DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use playhub_auth::{IdentityRef, Namespace};

/// Server-side record tying an issued bearer token to a device.
///
/// `expires_at` is always the issuing token's own expiry.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub identity_id: i64,
    #[sqlx(try_from = "String")]
    pub identity_kind: Namespace,
    pub token: String,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn identity(&self) -> IdentityRef {
        IdentityRef::new(self.identity_id, self.identity_kind)
    }

    /// Active and not yet expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub identity: IdentityRef,
    pub token: String,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Session as shown to its owner. The token itself is never returned.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_current: bool,
}

impl SessionView {
    pub fn from_session(session: &Session, is_current: bool) -> Self {
        Self {
            id: session.id,
            device_info: session.device_info.clone(),
            ip_address: session.ip_address.clone(),
            user_agent: session.user_agent.clone(),
            last_activity_at: session.last_activity_at,
            created_at: session.created_at,
            expires_at: session.expires_at,
            is_current,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevokeSessionsResponse {
    pub revoked: u64,
}
