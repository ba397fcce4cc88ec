use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use playhub_auth::{Claims, IdentityRef, IssuedToken, Namespace, TokenIssuer};
use playhub_core::{AuthError, verify_password};
use playhub_models::identity::Identity;
use playhub_models::session::{Session, SessionView};

use crate::metrics::{track_login_failure, track_login_success, track_token_issued};
use crate::modules::identities::repository::IdentityRepository;
use crate::modules::sessions::service::{DeviceContext, SessionService};

/// A verified identity together with its new token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub token: IssuedToken,
}

/// Credential checks and stateless token operations.
#[async_trait]
pub trait BasicAuth: Send + Sync {
    /// Resolves `email` in the user namespace, then the administrator namespace,
    /// and issues a token for the first one whose password matches.
    async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<LoginOutcome, AuthError>;

    async fn refresh(&self, token: &str, remember: bool) -> Result<IssuedToken, AuthError>;

    fn validate(&self, token: &str) -> Result<Claims, AuthError>;
}

/// [`BasicAuth`] plus server-side session tracking.
#[async_trait]
pub trait SessionAwareAuth: BasicAuth {
    async fn login_with_session(
        &self,
        email: &str,
        password: &str,
        remember: bool,
        device: DeviceContext,
    ) -> Result<(LoginOutcome, Session), AuthError>;

    async fn refresh_with_session(
        &self,
        token: &str,
        remember: bool,
        device: DeviceContext,
    ) -> Result<(IssuedToken, Session), AuthError>;

    /// Revokes the session bound to `token`. A token with no live session is a no-op.
    async fn logout(&self, identity: IdentityRef, token: &str) -> Result<(), AuthError>;

    async fn list_sessions(
        &self,
        identity: IdentityRef,
        current_token: &str,
    ) -> Result<Vec<SessionView>, AuthError>;

    async fn revoke_session(&self, identity: IdentityRef, session_id: Uuid)
    -> Result<(), AuthError>;

    async fn revoke_other_sessions(
        &self,
        identity: IdentityRef,
        current_token: &str,
    ) -> Result<u64, AuthError>;

    async fn revoke_all_sessions(&self, identity: IdentityRef) -> Result<u64, AuthError>;
}

#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn IdentityRepository>,
    sessions: SessionService,
    issuer: TokenIssuer,
}

impl AuthService {
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        sessions: SessionService,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            identities,
            sessions,
            issuer,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        for namespace in Namespace::PROBE_ORDER {
            let Some(identity) = self.identities.find_by_email(namespace, email).await? else {
                continue;
            };

            match verify_password(password, &identity.password_hash) {
                Ok(true) => return Ok(identity),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        identity = %identity.identity_ref(),
                        error = %e,
                        "Stored password hash is unreadable"
                    );
                }
            }
        }

        Err(AuthError::InvalidCredentials)
    }

    async fn record_login(&self, identity: IdentityRef) {
        if let Err(e) = self.identities.record_login(identity, Utc::now()).await {
            warn!(identity = %identity, error = %e, "Failed to update last login");
        }
    }
}

#[async_trait]
impl BasicAuth for AuthService {
    #[instrument(skip(self, password))]
    async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<LoginOutcome, AuthError> {
        let identity = match self.verify_credentials(email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                track_login_failure(if e.is_internal() { "error" } else { "invalid_credentials" });
                return Err(e);
            }
        };

        let token = self.issuer.issue(
            identity.identity_ref(),
            &identity.email,
            &identity.name,
            remember,
        )?;
        self.record_login(identity.identity_ref()).await;

        track_login_success(identity.namespace);
        track_token_issued("login");
        info!(identity = %identity.identity_ref(), remember, "Login succeeded");

        Ok(LoginOutcome { identity, token })
    }

    #[instrument(skip(self, token))]
    async fn refresh(&self, token: &str, remember: bool) -> Result<IssuedToken, AuthError> {
        let issued = self.issuer.refresh(token, remember)?;
        track_token_issued("refresh");
        Ok(issued)
    }

    fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.issuer.validate(token)
    }
}

#[async_trait]
impl SessionAwareAuth for AuthService {
    #[instrument(skip(self, password, device))]
    async fn login_with_session(
        &self,
        email: &str,
        password: &str,
        remember: bool,
        device: DeviceContext,
    ) -> Result<(LoginOutcome, Session), AuthError> {
        let outcome = self.login(email, password, remember).await?;
        let session = self
            .sessions
            .create(outcome.identity.identity_ref(), &outcome.token, device)
            .await?;
        Ok((outcome, session))
    }

    /// Only a token whose session is still live can be refreshed. The new
    /// session replaces the old one.
    #[instrument(skip(self, token, device))]
    async fn refresh_with_session(
        &self,
        token: &str,
        remember: bool,
        mut device: DeviceContext,
    ) -> Result<(IssuedToken, Session), AuthError> {
        let identity = self.issuer.validate(token)?.identity();
        let previous = self
            .sessions
            .current_session(identity, token)
            .await?
            .ok_or(AuthError::SessionRevoked)?;

        let issued = self.refresh(token, remember).await?;
        if device.device_info.is_none() {
            device.device_info = previous.device_info.clone();
        }
        let session = self.sessions.create(identity, &issued, device).await?;
        self.sessions.revoke_one(identity, previous.id).await?;

        Ok((issued, session))
    }

    #[instrument(skip(self, token), fields(identity = %identity))]
    async fn logout(&self, identity: IdentityRef, token: &str) -> Result<(), AuthError> {
        if let Some(session) = self.sessions.current_session(identity, token).await? {
            self.sessions.revoke_one(identity, session.id).await?;
        }
        Ok(())
    }

    async fn list_sessions(
        &self,
        identity: IdentityRef,
        current_token: &str,
    ) -> Result<Vec<SessionView>, AuthError> {
        self.sessions.list_active(identity, current_token).await
    }

    async fn revoke_session(
        &self,
        identity: IdentityRef,
        session_id: Uuid,
    ) -> Result<(), AuthError> {
        self.sessions.revoke_one(identity, session_id).await
    }

    async fn revoke_other_sessions(
        &self,
        identity: IdentityRef,
        current_token: &str,
    ) -> Result<u64, AuthError> {
        self.sessions.revoke_all_others(identity, current_token).await
    }

    async fn revoke_all_sessions(&self, identity: IdentityRef) -> Result<u64, AuthError> {
        self.sessions.revoke_all(identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryIdentityRepository, InMemorySessionRepository, test_jwt_config};

    struct Fixture {
        service: AuthService,
        identities: Arc<InMemoryIdentityRepository>,
    }

    fn fixture() -> Fixture {
        let identities = Arc::new(InMemoryIdentityRepository::default());
        let sessions = SessionService::new(Arc::new(InMemorySessionRepository::default()));
        let service = AuthService::new(
            identities.clone(),
            sessions,
            TokenIssuer::new(test_jwt_config()),
        );
        Fixture {
            service,
            identities,
        }
    }

    #[tokio::test]
    async fn test_login_resolves_each_namespace() {
        let f = fixture();
        let admin = f.identities.insert(Namespace::Admin, "ops@playhub.gg", "Ops", "admin-pass");
        let player = f.identities.insert(Namespace::User, "p1@playhub.gg", "P1", "user-pass");

        let outcome = f.service.login("ops@playhub.gg", "admin-pass", false).await.unwrap();
        assert_eq!(outcome.identity.namespace, Namespace::Admin);
        let claims = f.service.validate(&outcome.token.token).unwrap();
        assert_eq!(claims.identity(), admin.identity_ref());

        let outcome = f.service.login("p1@playhub.gg", "user-pass", false).await.unwrap();
        let claims = f.service.validate(&outcome.token.token).unwrap();
        assert_eq!(claims.identity(), player.identity_ref());
        assert_eq!(claims.ns, Namespace::User);
    }

    #[tokio::test]
    async fn test_login_prefers_user_namespace_when_email_in_both() {
        let f = fixture();
        f.identities.insert(Namespace::Admin, "dual@playhub.gg", "Admin", "shared-pass");
        f.identities.insert(Namespace::User, "dual@playhub.gg", "Player", "shared-pass");

        let outcome = f.service.login("dual@playhub.gg", "shared-pass", false).await.unwrap();
        assert_eq!(outcome.identity.namespace, Namespace::User);
    }

    #[tokio::test]
    async fn test_login_falls_through_to_admin_on_user_password_mismatch() {
        let f = fixture();
        f.identities.insert(Namespace::User, "dual@playhub.gg", "Player", "player-pass");
        f.identities.insert(Namespace::Admin, "dual@playhub.gg", "Admin", "admin-pass");

        let outcome = f.service.login("dual@playhub.gg", "admin-pass", false).await.unwrap();
        assert_eq!(outcome.identity.namespace, Namespace::Admin);
    }

    #[tokio::test]
    async fn test_login_skips_unreadable_hash() {
        let f = fixture();
        f.identities
            .insert_with_hash(Namespace::User, "dual@playhub.gg", "Player", "not-a-bcrypt-hash");
        f.identities.insert(Namespace::Admin, "dual@playhub.gg", "Admin", "admin-pass");

        let outcome = f.service.login("dual@playhub.gg", "admin-pass", false).await.unwrap();
        assert_eq!(outcome.identity.namespace, Namespace::Admin);

        assert!(matches!(
            f.service.login("dual@playhub.gg", "wrong", false).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let f = fixture();
        f.identities.insert(Namespace::User, "p1@playhub.gg", "P1", "user-pass");

        assert!(matches!(
            f.service.login("p1@playhub.gg", "wrong", false).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            f.service.login("ghost@playhub.gg", "user-pass", false).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_records_last_login() {
        let f = fixture();
        let player = f.identities.insert(Namespace::User, "p1@playhub.gg", "P1", "user-pass");
        assert!(player.last_login_at.is_none());

        f.service.login("p1@playhub.gg", "user-pass", false).await.unwrap();

        let stored = f.identities.get(player.identity_ref()).unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_login_with_session_ties_session_to_token() {
        let f = fixture();
        f.identities.insert(Namespace::User, "p1@playhub.gg", "P1", "user-pass");

        let (outcome, session) = f
            .service
            .login_with_session(
                "p1@playhub.gg",
                "user-pass",
                true,
                DeviceContext {
                    device_info: Some("Arcade cabinet 4".to_string()),
                    ip_address: Some("10.0.0.4".to_string()),
                    user_agent: Some("PlayHubKiosk/2.1".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(session.expires_at, outcome.token.expires_at);
        assert_eq!(session.identity(), outcome.identity.identity_ref());
        assert_eq!(session.ip_address.as_deref(), Some("10.0.0.4"));

        let listed = f
            .service
            .list_sessions(session.identity(), &outcome.token.token)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_current);
    }

    #[tokio::test]
    async fn test_refresh_with_session_replaces_session() {
        let f = fixture();
        f.identities.insert(Namespace::User, "p1@playhub.gg", "P1", "user-pass");
        let device = DeviceContext {
            device_info: Some("Arcade kiosk 4".to_string()),
            ..DeviceContext::default()
        };
        let (outcome, first) = f
            .service
            .login_with_session("p1@playhub.gg", "user-pass", false, device)
            .await
            .unwrap();

        let (renewed, second) = f
            .service
            .refresh_with_session(&outcome.token.token, false, DeviceContext::default())
            .await
            .unwrap();

        assert_ne!(renewed.token, outcome.token.token);
        assert_ne!(first.id, second.id);
        assert_eq!(second.expires_at, renewed.expires_at);
        assert_eq!(second.device_info.as_deref(), Some("Arcade kiosk 4"));

        let listed = f
            .service
            .list_sessions(second.identity(), &renewed.token)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn test_refresh_with_session_rejects_revoked_session() {
        let f = fixture();
        f.identities.insert(Namespace::User, "p1@playhub.gg", "P1", "user-pass");
        let (outcome, _) = f
            .service
            .login_with_session("p1@playhub.gg", "user-pass", false, DeviceContext::default())
            .await
            .unwrap();
        let identity = outcome.identity.identity_ref();
        f.service.revoke_all_sessions(identity).await.unwrap();

        let err = f
            .service
            .refresh_with_session(&outcome.token.token, false, DeviceContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::SessionRevoked));
        assert!(f.service.list_sessions(identity, "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_revokes_only_current_session() {
        let f = fixture();
        f.identities.insert(Namespace::User, "p1@playhub.gg", "P1", "user-pass");
        let (first, _) = f
            .service
            .login_with_session("p1@playhub.gg", "user-pass", false, DeviceContext::default())
            .await
            .unwrap();
        let (second, _) = f
            .service
            .login_with_session("p1@playhub.gg", "user-pass", false, DeviceContext::default())
            .await
            .unwrap();
        let identity = first.identity.identity_ref();

        f.service.logout(identity, &first.token.token).await.unwrap();

        let remaining = f.service.list_sessions(identity, &second.token.token).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_current);

        // Second logout with the same token finds nothing and still succeeds.
        f.service.logout(identity, &first.token.token).await.unwrap();
    }
}
