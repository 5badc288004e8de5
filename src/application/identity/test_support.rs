//! Fakes and helpers shared by the flow tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use uuid::Uuid;

use crate::auth::{PasswordHasher, TokenService};
use crate::domain::{
    Credential, CredentialStore, CredentialsWithUser, DomainError, DomainResult, EmailSender,
    PasswordResetToken, Querier, UserBasic,
};
use crate::infrastructure::database::entities::{auth_credential, password_reset_token, user};
use crate::infrastructure::SeaOrmCredentialStore;
use crate::support::errors::InfraError;

pub const TEST_SECRET: &str = "test-secret-that-is-at-least-32-bytes!";

pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_cost(4)
}

pub fn test_tokens() -> Arc<TokenService> {
    Arc::new(TokenService::new(
        TEST_SECRET,
        "identity-test",
        chrono::Duration::minutes(15),
        chrono::Duration::days(7),
    ))
}

pub async fn count_users(db: &DatabaseConnection) -> u64 {
    user::Entity::find().count(db).await.unwrap()
}

pub async fn count_credentials(db: &DatabaseConnection) -> u64 {
    auth_credential::Entity::find().count(db).await.unwrap()
}

pub async fn count_reset_tokens(db: &DatabaseConnection) -> u64 {
    password_reset_token::Entity::find().count(db).await.unwrap()
}

fn injected() -> DomainError {
    DomainError::Storage(InfraError::Database(sea_orm::DbErr::Custom(
        "injected failure".to_string(),
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateFault {
    None,
    Fail,
    Panic,
    Stall,
}

/// SeaORM credential store with switchable failures.
#[derive(Clone)]
pub struct FaultyCredentialStore {
    inner: SeaOrmCredentialStore,
    create: CreateFault,
    pub fail_record_login: Arc<AtomicBool>,
    pub fail_mark_used: Arc<AtomicBool>,
}

impl FaultyCredentialStore {
    pub fn new() -> Self {
        Self::with_create(CreateFault::None)
    }

    pub fn with_create(create: CreateFault) -> Self {
        Self {
            inner: SeaOrmCredentialStore::new(),
            create,
            fail_record_login: Arc::new(AtomicBool::new(false)),
            fail_mark_used: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl CredentialStore for FaultyCredentialStore {
    async fn create<C: Querier>(&self, db: &C, credential: &Credential) -> DomainResult<()> {
        match self.create {
            CreateFault::None => self.inner.create(db, credential).await,
            CreateFault::Fail => Err(injected()),
            CreateFault::Panic => panic!("credential store exploded"),
            CreateFault::Stall => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                self.inner.create(db, credential).await
            }
        }
    }

    async fn find_by_email_with_user<C: Querier>(
        &self,
        db: &C,
        email: &str,
    ) -> DomainResult<Option<CredentialsWithUser>> {
        self.inner.find_by_email_with_user(db, email).await
    }

    async fn record_login<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.fail_record_login.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.record_login(db, user_id, at).await
    }

    async fn record_failed_attempt<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.inner.record_failed_attempt(db, user_id, at).await
    }

    async fn create_reset_token<C: Querier>(
        &self,
        db: &C,
        token: &PasswordResetToken,
    ) -> DomainResult<()> {
        self.inner.create_reset_token(db, token).await
    }

    async fn find_reset_token<C: Querier>(
        &self,
        db: &C,
        token: &str,
    ) -> DomainResult<Option<PasswordResetToken>> {
        self.inner.find_reset_token(db, token).await
    }

    async fn mark_reset_token_used<C: Querier>(
        &self,
        db: &C,
        token: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        if self.fail_mark_used.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.mark_reset_token_used(db, token, at).await
    }

    async fn update_password_hash<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.inner.update_password_hash(db, user_id, password_hash, at).await
    }

    async fn find_user_basic_by_email<C: Querier>(
        &self,
        db: &C,
        email: &str,
    ) -> DomainResult<Option<UserBasic>> {
        self.inner.find_user_basic_by_email(db, email).await
    }
}

/// Email sender that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingEmailSender {
    pub fn failing() -> Self {
        let sender = Self::default();
        sender.fail.store(true, Ordering::SeqCst);
        sender
    }

    /// `(recipient, token)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), InfraError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(InfraError::Email("provider unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}
