//! Credential store interface
//!
//! Every call takes the connection or transaction it runs on, so the caller
//! decides which atomic unit a write belongs to.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Credential, CredentialsWithUser};
use crate::domain::password_reset::PasswordResetToken;
use crate::domain::user::UserBasic;
use crate::domain::{DomainResult, Querier};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create<C: Querier>(&self, db: &C, credential: &Credential) -> DomainResult<()>;

    /// Credential and owner for a login attempt. Soft-deleted users are not found.
    async fn find_by_email_with_user<C: Querier>(
        &self,
        db: &C,
        email: &str,
    ) -> DomainResult<Option<CredentialsWithUser>>;

    /// Stamp last login and clear the failed-attempt counter.
    async fn record_login<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;

    async fn record_failed_attempt<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;

    async fn create_reset_token<C: Querier>(
        &self,
        db: &C,
        token: &PasswordResetToken,
    ) -> DomainResult<()>;

    async fn find_reset_token<C: Querier>(
        &self,
        db: &C,
        token: &str,
    ) -> DomainResult<Option<PasswordResetToken>>;

    /// Set `used_at` if it is still unset. Returns whether this call set it.
    async fn mark_reset_token_used<C: Querier>(
        &self,
        db: &C,
        token: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Replace the stored hash; `UserNotFound` when the user has no credential.
    async fn update_password_hash<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;

    async fn find_user_basic_by_email<C: Querier>(
        &self,
        db: &C,
        email: &str,
    ) -> DomainResult<Option<UserBasic>>;
}
