use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, instrument, warn};
use url::Url;

use playhub_auth::Namespace;
use playhub_config::AuthPolicyConfig;
use playhub_core::secrets::{generate_reset_token, secrets_match};
use playhub_core::{AuthError, hash_password_with_cost};
use playhub_models::identity::Identity;
use playhub_models::password_reset::{NewPasswordResetToken, PasswordResetToken};

use super::repository::PasswordResetRepository;
use crate::metrics::track_password_reset;
use crate::modules::identities::repository::IdentityRepository;
use crate::utils::notifier::{NotificationDispatcher, TemplateData};

/// Issues, validates and consumes single-use password-reset tokens.
#[derive(Clone)]
pub struct PasswordResetService {
    identities: Arc<dyn IdentityRepository>,
    tokens: Arc<dyn PasswordResetRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    policy: AuthPolicyConfig,
    frontend_url: String,
}

impl PasswordResetService {
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        tokens: Arc<dyn PasswordResetRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
        policy: AuthPolicyConfig,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            identities,
            tokens,
            notifier,
            policy,
            frontend_url: frontend_url.into(),
        }
    }

    /// Issues a reset token for whichever identity owns `email` and sends the link.
    ///
    /// Any earlier unused token for that identity stops working.
    #[instrument(skip(self))]
    pub async fn initiate(&self, email: &str) -> Result<DateTime<Utc>, AuthError> {
        let identity = self.find_owner(email).await?.ok_or(AuthError::EmailNotFound)?;
        let identity_ref = identity.identity_ref();
        let now = Utc::now();

        self.tokens.invalidate_unused(identity_ref, now).await?;

        let token = generate_reset_token();
        let link = self.reset_link(&token, &identity.email)?;
        let stored = self
            .tokens
            .create(NewPasswordResetToken {
                identity: identity_ref,
                token: token.clone(),
                expires_at: now + Duration::minutes(self.policy.password_reset_ttl_minutes),
            })
            .await?;

        self.send_reset_link(&identity, &token, link).await;

        track_password_reset("requested");
        info!(identity = %identity_ref, "Password reset requested");
        Ok(stored.expires_at)
    }

    /// Checks that `token` exists, is unused and has not expired.
    #[instrument(skip(self, token))]
    pub async fn validate(&self, token: &str) -> Result<PasswordResetToken, AuthError> {
        let stored = self
            .tokens
            .find_by_token(token)
            .await?
            .filter(|t| secrets_match(&t.token, token))
            .ok_or(AuthError::InvalidOrExpiredResetToken)?;

        if !stored.is_usable_at(Utc::now()) {
            return Err(AuthError::InvalidOrExpiredResetToken);
        }

        Ok(stored)
    }

    /// Sets a new password using a reset token. The token works once.
    #[instrument(skip(self, token, new_password, confirm_password))]
    pub async fn complete(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        if !secrets_match(new_password, confirm_password) {
            return Err(AuthError::PasswordMismatch);
        }
        if new_password.chars().count() < self.policy.password_min_length {
            return Err(AuthError::WeakPassword {
                min_length: self.policy.password_min_length,
            });
        }

        let stored = self.validate(token).await?;
        let identity_ref = stored.identity();

        // The email must name the token's identity within the token's own namespace.
        let identity = self
            .identities
            .find_by_email(identity_ref.namespace, email)
            .await?
            .filter(|i| i.id == identity_ref.id)
            .ok_or(AuthError::InvalidOrExpiredResetToken)?;

        let password_hash = hash_password_with_cost(new_password, self.policy.bcrypt_cost)?;

        let now = Utc::now();
        if !self.tokens.mark_used(stored.id, now).await? {
            return Err(AuthError::InvalidOrExpiredResetToken);
        }

        if let Err(e) = self
            .identities
            .update_password(identity_ref, &password_hash)
            .await
        {
            error!(
                identity = %identity_ref,
                error = %e,
                "Reset token consumed but password was not updated"
            );
            return Err(e.into());
        }
        self.tokens.invalidate_unused(identity_ref, now).await?;

        self.send_confirmation(&identity).await;

        track_password_reset("completed");
        info!(identity = %identity_ref, "Password reset completed");
        Ok(())
    }

    async fn find_owner(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        for namespace in Namespace::PROBE_ORDER {
            if let Some(identity) = self.identities.find_by_email(namespace, email).await? {
                return Ok(Some(identity));
            }
        }
        Ok(None)
    }

    fn reset_link(&self, token: &str, email: &str) -> Result<Url, AuthError> {
        let base = format!("{}/reset-password", self.frontend_url.trim_end_matches('/'));
        let link = Url::parse_with_params(&base, &[("token", token), ("email", email)])
            .with_context(|| format!("Invalid FRONTEND_URL '{}'", self.frontend_url))?;
        Ok(link)
    }

    async fn send_reset_link(&self, identity: &Identity, token: &str, link: Url) {
        let minutes = self.policy.password_reset_ttl_minutes;
        let content = format!(
            "Hi {},\n\n\
             You requested to reset your password.\n\n\
             Open the link below to choose a new one:\n{}\n\n\
             This link will expire in {} minutes.\n\n\
             If you didn't request this, please ignore this email.",
            identity.name, link, minutes
        );

        let mut data = TemplateData::new();
        data.insert("name".to_string(), identity.name.clone());
        data.insert("token".to_string(), token.to_string());
        data.insert("action_url".to_string(), link.into());
        data.insert("action_label".to_string(), "Reset Password".to_string());
        data.insert("expires_in_minutes".to_string(), minutes.to_string());

        if let Err(e) = self
            .notifier
            .send_notification(&identity.email, "Password Reset Request", &content, &data)
            .await
        {
            warn!(identity = %identity.identity_ref(), error = %e, "Failed to send password reset email");
        }
    }

    async fn send_confirmation(&self, identity: &Identity) {
        let content = format!(
            "Hi {},\n\n\
             Your password has been successfully reset.\n\n\
             If you didn't make this change, please contact support immediately.",
            identity.name
        );

        let mut data = TemplateData::new();
        data.insert("name".to_string(), identity.name.clone());

        if let Err(e) = self
            .notifier
            .send_notification(&identity.email, "Password Reset Successful", &content, &data)
            .await
        {
            warn!(identity = %identity.identity_ref(), error = %e, "Failed to send password reset confirmation");
        }
    }
}
