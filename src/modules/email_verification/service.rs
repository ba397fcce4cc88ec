use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use playhub_auth::IdentityRef;
use playhub_config::AuthPolicyConfig;
use playhub_core::AuthError;
use playhub_core::secrets::{
    VERIFICATION_CODE_DIGITS, generate_numeric_code, hash_secret, secrets_match,
};
use playhub_models::email_verification::NewEmailVerificationCode;

use super::repository::EmailVerificationRepository;
use crate::metrics::track_email_change;
use crate::modules::identities::repository::IdentityRepository;
use crate::utils::notifier::{NotificationDispatcher, TemplateData};

/// A code that was generated and handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct EmailVerificationService {
    identities: Arc<dyn IdentityRepository>,
    codes: Arc<dyn EmailVerificationRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    policy: AuthPolicyConfig,
}

impl EmailVerificationService {
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        codes: Arc<dyn EmailVerificationRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
        policy: AuthPolicyConfig,
    ) -> Self {
        Self {
            identities,
            codes,
            notifier,
            policy,
        }
    }

    /// Sends a verification code to `new_email`.
    ///
    /// Replaces any pending code for the same identity and address. Only the
    /// code's SHA-256 digest is stored.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn request_change(
        &self,
        identity: IdentityRef,
        new_email: &str,
    ) -> Result<IssuedCode, AuthError> {
        let current = self
            .identities
            .find_by_id(identity)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if current.email.eq_ignore_ascii_case(new_email) {
            return Err(AuthError::EmailUnchanged);
        }
        if self.identities.email_exists(new_email).await? {
            return Err(AuthError::EmailConflict);
        }

        self.codes.delete_for(identity, new_email).await?;

        let code = generate_numeric_code(VERIFICATION_CODE_DIGITS);
        let expires_at = Utc::now() + Duration::minutes(self.policy.email_code_ttl_minutes);
        self.codes
            .create(NewEmailVerificationCode {
                identity,
                email: new_email.to_string(),
                code_hash: hash_secret(&code),
                expires_at,
            })
            .await?;

        self.send_code(&current.name, new_email, &code).await;

        track_email_change("requested");
        info!("Email change verification code issued");
        Ok(IssuedCode { code, expires_at })
    }

    /// Applies the email change if `code` matches the latest pending code.
    #[instrument(skip(self, code), fields(identity = %identity))]
    pub async fn confirm(
        &self,
        identity: IdentityRef,
        new_email: &str,
        code: &str,
    ) -> Result<(), AuthError> {
        let code_hash = hash_secret(code.trim());
        let pending = self
            .codes
            .find_latest(identity, new_email, &code_hash)
            .await?
            .filter(|c| secrets_match(&c.code_hash, &code_hash))
            .ok_or(AuthError::VerificationCodeInvalid)?;

        if Utc::now() >= pending.expires_at {
            return Err(AuthError::VerificationCodeInvalid);
        }
        if !self.codes.delete(pending.id).await? {
            return Err(AuthError::VerificationCodeInvalid);
        }
        if self.identities.email_exists(new_email).await? {
            return Err(AuthError::EmailConflict);
        }

        self.identities.update_email(identity, new_email).await?;

        track_email_change("completed");
        info!("Email address changed");
        Ok(())
    }

    async fn send_code(&self, name: &str, new_email: &str, code: &str) {
        let minutes = self.policy.email_code_ttl_minutes;
        let content = format!(
            "Hi {},\n\n\
             Use this code to confirm your new email address:\n\n{}\n\n\
             The code expires in {} minutes. If you didn't request this change, \
             you can ignore this email.",
            name, code, minutes
        );

        let mut data = TemplateData::new();
        data.insert("name".to_string(), name.to_string());
        data.insert("code".to_string(), code.to_string());
        data.insert("expires_in_minutes".to_string(), minutes.to_string());

        if let Err(e) = self
            .notifier
            .send_notification(new_email, "Confirm your new email address", &content, &data)
            .await
        {
            warn!(error = %e, "Failed to send email verification code");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        InMemoryEmailVerificationRepository, InMemoryIdentityRepository, RecordingNotifier,
        test_policy,
    };
    use playhub_auth::Namespace;

    struct Fixture {
        service: EmailVerificationService,
        identities: Arc<InMemoryIdentityRepository>,
        codes: Arc<InMemoryEmailVerificationRepository>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let identities = Arc::new(InMemoryIdentityRepository::default());
        let codes = Arc::new(InMemoryEmailVerificationRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = EmailVerificationService::new(
            identities.clone(),
            codes.clone(),
            notifier.clone(),
            test_policy(),
        );
        Fixture {
            service,
            identities,
            codes,
            notifier,
        }
    }

    fn wrong_codes(correct: &str) -> Vec<String> {
        ["000000", "111111", "222222", "333333"]
            .into_iter()
            .filter(|c| *c != correct)
            .take(3)
            .map(String::from)
            .collect()
    }

    #[tokio::test]
    async fn test_request_change_sends_code_to_new_address() {
        let f = fixture();
        let player = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");

        let issued = f.service.request_change(player.identity_ref(), "b@x.com").await.unwrap();

        assert_eq!(issued.code.len(), 6);
        assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
        let sent = f.notifier.last().unwrap();
        assert_eq!(sent.recipient, "b@x.com");
        assert_eq!(sent.template_data["code"], issued.code);

        let stored = f.codes.all();
        assert_eq!(stored.len(), 1);
        assert_ne!(stored[0].code_hash, issued.code);
        assert_eq!(stored[0].code_hash, hash_secret(&issued.code));
    }

    #[tokio::test]
    async fn test_request_change_rejects_same_email_any_case() {
        let f = fixture();
        let player = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");

        assert!(matches!(
            f.service.request_change(player.identity_ref(), "A@X.com").await,
            Err(AuthError::EmailUnchanged)
        ));
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_request_change_rejects_email_held_in_other_namespace() {
        let f = fixture();
        let player = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");
        f.identities.insert(Namespace::Admin, "ops@x.com", "Ops", "pass123");

        assert!(matches!(
            f.service.request_change(player.identity_ref(), "ops@x.com").await,
            Err(AuthError::EmailConflict)
        ));
    }

    #[tokio::test]
    async fn test_request_change_replaces_pending_code() {
        let f = fixture();
        let player = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");
        let identity = player.identity_ref();

        let first = f.service.request_change(identity, "b@x.com").await.unwrap();
        let second = f.service.request_change(identity, "b@x.com").await.unwrap();

        assert_eq!(f.codes.all().len(), 1);
        if first.code != second.code {
            assert!(matches!(
                f.service.confirm(identity, "b@x.com", &first.code).await,
                Err(AuthError::VerificationCodeInvalid)
            ));
        }
        f.service.confirm(identity, "b@x.com", &second.code).await.unwrap();
    }

    #[tokio::test]
    async fn test_three_wrong_codes_then_correct_then_replay() {
        let f = fixture();
        let player = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");
        let identity = player.identity_ref();
        let issued = f.service.request_change(identity, "b@x.com").await.unwrap();

        for wrong in wrong_codes(&issued.code) {
            assert!(matches!(
                f.service.confirm(identity, "b@x.com", &wrong).await,
                Err(AuthError::VerificationCodeInvalid)
            ));
        }

        f.service.confirm(identity, "b@x.com", &issued.code).await.unwrap();
        assert!(f.codes.all().is_empty());
        assert_eq!(f.identities.get(identity).unwrap().email, "b@x.com");

        assert!(matches!(
            f.service.confirm(identity, "b@x.com", &issued.code).await,
            Err(AuthError::VerificationCodeInvalid)
        ));
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected() {
        let f = fixture();
        let player = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");
        let identity = player.identity_ref();
        let issued = f.service.request_change(identity, "b@x.com").await.unwrap();

        f.codes.rewind_all(Duration::minutes(11));

        assert!(matches!(
            f.service.confirm(identity, "b@x.com", &issued.code).await,
            Err(AuthError::VerificationCodeInvalid)
        ));
        assert_eq!(f.identities.get(identity).unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn test_code_is_bound_to_identity_and_address() {
        let f = fixture();
        let ana = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");
        let ben = f.identities.insert(Namespace::User, "ben@x.com", "Ben", "pass123");
        let issued = f
            .service
            .request_change(ana.identity_ref(), "b@x.com")
            .await
            .unwrap();

        assert!(matches!(
            f.service.confirm(ben.identity_ref(), "b@x.com", &issued.code).await,
            Err(AuthError::VerificationCodeInvalid)
        ));
        assert!(matches!(
            f.service.confirm(ana.identity_ref(), "c@x.com", &issued.code).await,
            Err(AuthError::VerificationCodeInvalid)
        ));
    }

    #[tokio::test]
    async fn test_confirm_rejects_address_taken_meanwhile() {
        let f = fixture();
        let ana = f.identities.insert(Namespace::User, "a@x.com", "Ana", "pass123");
        let issued = f
            .service
            .request_change(ana.identity_ref(), "b@x.com")
            .await
            .unwrap();
        f.identities.insert(Namespace::Admin, "b@x.com", "Late", "pass123");

        assert!(matches!(
            f.service.confirm(ana.identity_ref(), "b@x.com", &issued.code).await,
            Err(AuthError::EmailConflict)
        ));
    }
}
