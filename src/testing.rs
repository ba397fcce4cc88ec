//! In-memory collaborators for tests.
//!
//! Each repository mirrors the semantics of its PostgreSQL counterpart closely
//! enough for service and router tests, and adds a few helpers for inspecting
//! state and moving stored timestamps into the past.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use playhub_auth::{IdentityRef, Namespace};
use playhub_config::{AuthPolicyConfig, CorsConfig, EmailConfig, JwtConfig};
use playhub_core::hash_password_with_cost;
use playhub_models::email_verification::{EmailVerificationCode, NewEmailVerificationCode};
use playhub_models::identity::{Identity, NewIdentity};
use playhub_models::password_reset::{NewPasswordResetToken, PasswordResetToken};
use playhub_models::session::{NewSession, Session};

use crate::modules::email_verification::repository::EmailVerificationRepository;
use crate::modules::identities::repository::IdentityRepository;
use crate::modules::password_reset::repository::PasswordResetRepository;
use crate::modules::sessions::repository::SessionRepository;
use crate::state::{AppConfig, AppState, Repositories};
use crate::utils::notifier::{NotificationDispatcher, TemplateData};

const FIXTURE_BCRYPT_COST: u32 = 4;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        issuer: "playhub-test".to_string(),
        expiry_seconds: 3600,
        remember_days: 7,
    }
}

pub fn test_policy() -> AuthPolicyConfig {
    AuthPolicyConfig {
        bcrypt_cost: FIXTURE_BCRYPT_COST,
        ..AuthPolicyConfig::default()
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt: test_jwt_config(),
        email: EmailConfig {
            frontend_url: "https://play.example.com".to_string(),
            ..EmailConfig::default()
        },
        cors: CorsConfig::default(),
        policy: test_policy(),
    }
}

// Identities

#[derive(Default)]
struct IdentityTables {
    admins: Vec<Identity>,
    users: Vec<Identity>,
}

impl IdentityTables {
    fn table(&self, namespace: Namespace) -> &Vec<Identity> {
        match namespace {
            Namespace::Admin => &self.admins,
            Namespace::User => &self.users,
        }
    }

    fn table_mut(&mut self, namespace: Namespace) -> &mut Vec<Identity> {
        match namespace {
            Namespace::Admin => &mut self.admins,
            Namespace::User => &mut self.users,
        }
    }

    fn find_mut(&mut self, identity: IdentityRef) -> Option<&mut Identity> {
        self.table_mut(identity.namespace)
            .iter_mut()
            .find(|i| i.id == identity.id)
    }
}

/// Two independent tables with their own id sequences, like the real schema.
#[derive(Default)]
pub struct InMemoryIdentityRepository {
    tables: Mutex<IdentityTables>,
    reject_password_updates: AtomicBool,
}

impl InMemoryIdentityRepository {
    /// Adds an identity with a cheaply hashed password.
    pub fn insert(&self, namespace: Namespace, email: &str, name: &str, password: &str) -> Identity {
        let password_hash = hash_password_with_cost(password, FIXTURE_BCRYPT_COST)
            .unwrap_or_else(|e| panic!("fixture hash failed: {e}"));
        self.insert_hashed(NewIdentity {
            namespace,
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
        })
    }

    /// Adds an identity whose stored hash is taken verbatim.
    pub fn insert_with_hash(
        &self,
        namespace: Namespace,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Identity {
        self.insert_hashed(NewIdentity {
            namespace,
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    /// Makes every later `update_password` fail.
    pub fn reject_password_updates(&self) {
        self.reject_password_updates.store(true, Ordering::SeqCst);
    }

    fn insert_hashed(&self, new: NewIdentity) -> Identity {
        let mut tables = lock(&self.tables);
        let table = tables.table_mut(new.namespace);
        let identity = Identity {
            id: table.len() as i64 + 1,
            namespace: new.namespace,
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            last_login_at: None,
            created_at: Utc::now(),
        };
        table.push(identity.clone());
        identity
    }

    pub fn get(&self, identity: IdentityRef) -> Option<Identity> {
        lock(&self.tables)
            .table(identity.namespace)
            .iter()
            .find(|i| i.id == identity.id)
            .cloned()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn find_by_email(
        &self,
        namespace: Namespace,
        email: &str,
    ) -> Result<Option<Identity>, sqlx::Error> {
        Ok(lock(&self.tables)
            .table(namespace)
            .iter()
            .find(|i| i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, identity: IdentityRef) -> Result<Option<Identity>, sqlx::Error> {
        Ok(self.get(identity))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let tables = lock(&self.tables);
        Ok(Namespace::PROBE_ORDER.iter().any(|ns| {
            tables
                .table(*ns)
                .iter()
                .any(|i| i.email.eq_ignore_ascii_case(email))
        }))
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, sqlx::Error> {
        if self.find_by_email(new.namespace, &new.email).await?.is_some() {
            return Err(sqlx::Error::Protocol(format!(
                "duplicate email in {}",
                new.namespace
            )));
        }
        Ok(self.insert_hashed(new))
    }

    async fn update_password(
        &self,
        identity: IdentityRef,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        if self.reject_password_updates.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        if let Some(row) = lock(&self.tables).find_mut(identity) {
            row.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn update_email(&self, identity: IdentityRef, email: &str) -> Result<(), sqlx::Error> {
        if let Some(row) = lock(&self.tables).find_mut(identity) {
            row.email = email.to_string();
        }
        Ok(())
    }

    async fn record_login(
        &self,
        identity: IdentityRef,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        if let Some(row) = lock(&self.tables).find_mut(identity) {
            row.last_login_at = Some(at);
        }
        Ok(())
    }
}

/// An identity store whose every call fails, for exercising the 500 path.
pub struct UnavailableIdentityRepository;

#[async_trait]
impl IdentityRepository for UnavailableIdentityRepository {
    async fn find_by_email(&self, _: Namespace, _: &str) -> Result<Option<Identity>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn find_by_id(&self, _: IdentityRef) -> Result<Option<Identity>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn email_exists(&self, _: &str) -> Result<bool, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn create(&self, _: NewIdentity) -> Result<Identity, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn update_password(&self, _: IdentityRef, _: &str) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn update_email(&self, _: IdentityRef, _: &str) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn record_login(&self, _: IdentityRef, _: DateTime<Utc>) -> Result<(), sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }
}

// Sessions

#[derive(Default)]
pub struct InMemorySessionRepository {
    rows: Mutex<Vec<Session>>,
}

impl InMemorySessionRepository {
    pub fn get(&self, id: Uuid) -> Option<Session> {
        lock(&self.rows).iter().find(|s| s.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_last_activity(&self, id: Uuid, at: DateTime<Utc>) {
        if let Some(row) = lock(&self.rows).iter_mut().find(|s| s.id == id) {
            row.last_activity_at = at;
        }
    }

    /// Moves a session's expiry into the past.
    pub fn expire(&self, id: Uuid) {
        if let Some(row) = lock(&self.rows).iter_mut().find(|s| s.id == id) {
            row.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, new: NewSession) -> Result<Session, sqlx::Error> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            identity_id: new.identity.id,
            identity_kind: new.identity.namespace,
            token: new.token,
            device_info: new.device_info,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            is_active: true,
            last_activity_at: now,
            created_at: now,
            expires_at: new.expires_at,
        };
        lock(&self.rows).push(session.clone());
        Ok(session)
    }

    async fn list_active(
        &self,
        identity: IdentityRef,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let mut sessions: Vec<Session> = lock(&self.rows)
            .iter()
            .filter(|s| s.identity() == identity && s.is_valid_at(now))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        Ok(sessions)
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        self.set_last_activity(id, at);
        Ok(())
    }

    async fn deactivate(&self, id: Uuid, identity: IdentityRef) -> Result<u64, sqlx::Error> {
        let mut rows = lock(&self.rows);
        let Some(row) = rows
            .iter_mut()
            .find(|s| s.id == id && s.identity() == identity)
        else {
            return Ok(0);
        };
        row.is_active = false;
        Ok(1)
    }

    async fn deactivate_all(
        &self,
        identity: IdentityRef,
        keep: Option<Uuid>,
    ) -> Result<u64, sqlx::Error> {
        let mut revoked = 0;
        for row in lock(&self.rows).iter_mut() {
            if row.identity() == identity && row.is_active && Some(row.id) != keep {
                row.is_active = false;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|s| s.expires_at >= now);
        Ok((before - rows.len()) as u64)
    }
}

// Password reset tokens

#[derive(Default)]
pub struct InMemoryPasswordResetRepository {
    rows: Mutex<Vec<PasswordResetToken>>,
}

impl InMemoryPasswordResetRepository {
    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shifts a token's creation and expiry times `by` into the past.
    pub fn rewind(&self, token: &str, by: Duration) {
        if let Some(row) = lock(&self.rows).iter_mut().find(|t| t.token == token) {
            row.created_at -= by;
            row.expires_at -= by;
        }
    }
}

#[async_trait]
impl PasswordResetRepository for InMemoryPasswordResetRepository {
    async fn create(&self, new: NewPasswordResetToken) -> Result<PasswordResetToken, sqlx::Error> {
        let row = PasswordResetToken {
            id: Uuid::new_v4(),
            identity_id: new.identity.id,
            identity_kind: new.identity.namespace,
            token: new.token,
            expires_at: new.expires_at,
            used_at: None,
            created_at: Utc::now(),
        };
        lock(&self.rows).push(row.clone());
        Ok(row)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        Ok(lock(&self.rows).iter().find(|t| t.token == token).cloned())
    }

    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, sqlx::Error> {
        let mut rows = lock(&self.rows);
        match rows.iter_mut().find(|t| t.id == id && t.used_at.is_none()) {
            Some(row) => {
                row.used_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn invalidate_unused(
        &self,
        identity: IdentityRef,
        at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let mut changed = 0;
        for row in lock(&self.rows).iter_mut() {
            if row.identity() == identity && row.used_at.is_none() {
                row.used_at = Some(at);
                changed += 1;
            }
        }
        Ok(changed)
    }
}

// Email verification codes

#[derive(Default)]
pub struct InMemoryEmailVerificationRepository {
    rows: Mutex<Vec<EmailVerificationCode>>,
}

impl InMemoryEmailVerificationRepository {
    pub fn all(&self) -> Vec<EmailVerificationCode> {
        lock(&self.rows).clone()
    }

    /// Shifts every code's creation and expiry times `by` into the past.
    pub fn rewind_all(&self, by: Duration) {
        for row in lock(&self.rows).iter_mut() {
            row.created_at -= by;
            row.expires_at -= by;
        }
    }
}

#[async_trait]
impl EmailVerificationRepository for InMemoryEmailVerificationRepository {
    async fn create(
        &self,
        new: NewEmailVerificationCode,
    ) -> Result<EmailVerificationCode, sqlx::Error> {
        let row = EmailVerificationCode {
            id: Uuid::new_v4(),
            identity_id: new.identity.id,
            identity_kind: new.identity.namespace,
            email: new.email,
            code_hash: new.code_hash,
            expires_at: new.expires_at,
            created_at: Utc::now(),
        };
        lock(&self.rows).push(row.clone());
        Ok(row)
    }

    async fn find_latest(
        &self,
        identity: IdentityRef,
        email: &str,
        code_hash: &str,
    ) -> Result<Option<EmailVerificationCode>, sqlx::Error> {
        Ok(lock(&self.rows)
            .iter()
            .filter(|c| {
                c.identity() == identity
                    && c.email.eq_ignore_ascii_case(email)
                    && c.code_hash == code_hash
            })
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn delete_for(&self, identity: IdentityRef, email: &str) -> Result<u64, sqlx::Error> {
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|c| !(c.identity() == identity && c.email.eq_ignore_ascii_case(email)));
        Ok((before - rows.len()) as u64)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() < before)
    }
}

// Notifications

#[derive(Debug, Clone)]
pub struct SentNotification {
    pub recipient: String,
    pub subject: String,
    pub content: String,
    pub template_data: TemplateData,
}

/// Keeps every notification instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        lock(&self.sent).clone()
    }

    pub fn last(&self) -> Option<SentNotification> {
        lock(&self.sent).last().cloned()
    }

    pub fn last_to(&self, recipient: &str) -> Option<SentNotification> {
        lock(&self.sent)
            .iter()
            .rev()
            .find(|n| n.recipient == recipient)
            .cloned()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn send_notification(
        &self,
        recipient: &str,
        subject: &str,
        content: &str,
        template_data: &TemplateData,
    ) -> anyhow::Result<()> {
        lock(&self.sent).push(SentNotification {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
            template_data: template_data.clone(),
        });
        Ok(())
    }
}

/// Rejects every notification.
pub struct FailingNotifier;

#[async_trait]
impl NotificationDispatcher for FailingNotifier {
    async fn send_notification(
        &self,
        _recipient: &str,
        _subject: &str,
        _content: &str,
        _template_data: &TemplateData,
    ) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("SMTP relay unreachable"))
    }
}

/// A fully wired [`AppState`] over in-memory stores, with handles to inspect them.
pub struct TestState {
    pub state: AppState,
    pub identities: Arc<InMemoryIdentityRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub password_resets: Arc<InMemoryPasswordResetRepository>,
    pub email_codes: Arc<InMemoryEmailVerificationRepository>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestState {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let identities = Arc::new(InMemoryIdentityRepository::default());
        let sessions = Arc::new(InMemorySessionRepository::default());
        let password_resets = Arc::new(InMemoryPasswordResetRepository::default());
        let email_codes = Arc::new(InMemoryEmailVerificationRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let state = AppState::new(
            Repositories {
                identities: identities.clone(),
                sessions: sessions.clone(),
                password_resets: password_resets.clone(),
                email_codes: email_codes.clone(),
            },
            notifier.clone(),
            config,
        );

        Self {
            state,
            identities,
            sessions,
            password_resets,
            email_codes,
            notifier,
        }
    }
}

impl Default for TestState {
    fn default() -> Self {
        Self::new()
    }
}
