use std::sync::Arc;

use sqlx::PgPool;

use playhub_auth::TokenIssuer;
use playhub_config::{AuthPolicyConfig, CorsConfig, EmailConfig, JwtConfig};

use crate::modules::auth::service::AuthService;
use crate::modules::email_verification::repository::{
    EmailVerificationRepository, PgEmailVerificationRepository,
};
use crate::modules::email_verification::service::EmailVerificationService;
use crate::modules::identities::repository::{IdentityRepository, PgIdentityRepository};
use crate::modules::password_reset::repository::{
    PasswordResetRepository, PgPasswordResetRepository,
};
use crate::modules::password_reset::service::PasswordResetService;
use crate::modules::sessions::repository::{PgSessionRepository, SessionRepository};
use crate::modules::sessions::service::SessionService;
use crate::utils::notifier::{NotificationDispatcher, dispatcher_from_config};

/// Storage backends the services are built on.
#[derive(Clone)]
pub struct Repositories {
    pub identities: Arc<dyn IdentityRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub password_resets: Arc<dyn PasswordResetRepository>,
    pub email_codes: Arc<dyn EmailVerificationRepository>,
}

impl Repositories {
    pub fn postgres(db: PgPool) -> Self {
        Self {
            identities: Arc::new(PgIdentityRepository::new(db.clone())),
            sessions: Arc::new(PgSessionRepository::new(db.clone())),
            password_resets: Arc::new(PgPasswordResetRepository::new(db.clone())),
            email_codes: Arc::new(PgEmailVerificationRepository::new(db)),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub cors: CorsConfig,
    pub policy: AuthPolicyConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            email: EmailConfig::from_env(),
            cors: CorsConfig::from_env(),
            policy: AuthPolicyConfig::from_env(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub password_reset: PasswordResetService,
    pub email_verification: EmailVerificationService,
    pub identities: Arc<dyn IdentityRepository>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the services from already-built collaborators.
    pub fn new(
        repositories: Repositories,
        notifier: Arc<dyn NotificationDispatcher>,
        config: AppConfig,
    ) -> Self {
        let sessions = SessionService::new(repositories.sessions);
        let auth = AuthService::new(
            repositories.identities.clone(),
            sessions,
            TokenIssuer::new(config.jwt.clone()),
        );
        let password_reset = PasswordResetService::new(
            repositories.identities.clone(),
            repositories.password_resets,
            notifier.clone(),
            config.policy.clone(),
            config.email.frontend_url.clone(),
        );
        let email_verification = EmailVerificationService::new(
            repositories.identities.clone(),
            repositories.email_codes,
            notifier,
            config.policy.clone(),
        );

        Self {
            auth,
            password_reset,
            email_verification,
            identities: repositories.identities,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionService {
        self.auth.sessions()
    }
}

pub fn init_app_state(db: PgPool) -> AppState {
    let config = AppConfig::from_env();
    let notifier = dispatcher_from_config(&config.email);
    AppState::new(Repositories::postgres(db), notifier, config)
}
