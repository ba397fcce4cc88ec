use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use playhub_auth::{IdentityRef, IssuedToken};
use playhub_core::AuthError;
use playhub_core::secrets::secrets_match;
use playhub_models::session::{NewSession, Session, SessionView};

use super::repository::SessionRepository;
use crate::metrics::{track_sessions_revoked, track_sessions_swept};

/// Client details recorded on a new session.
#[derive(Debug, Clone, Default)]
pub struct DeviceContext {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Per-device session registry.
///
/// Sessions are identified to their owner by comparing token digests, never by
/// plain string equality.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// Records a session for a freshly issued token. The session expires with the token.
    #[instrument(skip(self, issued, device), fields(identity = %identity))]
    pub async fn create(
        &self,
        identity: IdentityRef,
        issued: &IssuedToken,
        device: DeviceContext,
    ) -> Result<Session, AuthError> {
        let session = self
            .sessions
            .create(NewSession {
                identity,
                token: issued.token.clone(),
                device_info: device.device_info,
                ip_address: device.ip_address,
                user_agent: device.user_agent,
                expires_at: issued.expires_at,
            })
            .await?;

        Ok(session)
    }

    #[instrument(skip(self, current_token), fields(identity = %identity))]
    pub async fn list_active(
        &self,
        identity: IdentityRef,
        current_token: &str,
    ) -> Result<Vec<SessionView>, AuthError> {
        let sessions = self.sessions.list_active(identity, Utc::now()).await?;

        Ok(sessions
            .iter()
            .map(|s| SessionView::from_session(s, secrets_match(&s.token, current_token)))
            .collect())
    }

    /// The active session bound to `token`, if any.
    pub async fn current_session(
        &self,
        identity: IdentityRef,
        token: &str,
    ) -> Result<Option<Session>, AuthError> {
        let sessions = self.sessions.list_active(identity, Utc::now()).await?;
        Ok(sessions.into_iter().find(|s| secrets_match(&s.token, token)))
    }

    /// Best-effort heartbeat; failures are logged and swallowed.
    pub async fn touch(&self, id: Uuid) {
        if let Err(e) = self.sessions.touch(id, Utc::now()).await {
            warn!(session_id = %id, error = %e, "Failed to update session activity");
        }
    }

    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn revoke_one(&self, identity: IdentityRef, id: Uuid) -> Result<(), AuthError> {
        let revoked = self.sessions.deactivate(id, identity).await?;
        if revoked == 0 {
            return Err(AuthError::SessionNotFound);
        }

        track_sessions_revoked(revoked, "one");
        info!(session_id = %id, "Session revoked");
        Ok(())
    }

    /// Revokes every session except the one bound to `current_token`.
    #[instrument(skip(self, current_token), fields(identity = %identity))]
    pub async fn revoke_all_others(
        &self,
        identity: IdentityRef,
        current_token: &str,
    ) -> Result<u64, AuthError> {
        let keep = self
            .current_session(identity, current_token)
            .await?
            .map(|s| s.id);
        let revoked = self.sessions.deactivate_all(identity, keep).await?;

        track_sessions_revoked(revoked, "others");
        info!(revoked, "Other sessions revoked");
        Ok(revoked)
    }

    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn revoke_all(&self, identity: IdentityRef) -> Result<u64, AuthError> {
        let revoked = self.sessions.deactivate_all(identity, None).await?;

        track_sessions_revoked(revoked, "all");
        info!(revoked, "All sessions revoked");
        Ok(revoked)
    }

    /// Deletes sessions whose expiry has passed.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> Result<u64, AuthError> {
        let swept = self.sessions.delete_expired(Utc::now()).await?;

        track_sessions_swept(swept);
        if swept > 0 {
            info!(swept, "Expired sessions deleted");
        }
        Ok(swept)
    }
}
