//! Forgot-password and reset-password flows

use std::sync::Arc;

use chrono::Duration;
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{PasswordHasher, PasswordPolicy};
use crate::domain::{
    CredentialStore, DomainError, DomainResult, EmailSender, PasswordResetToken,
};
use crate::support::time::Clock;

pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 20;

/// Fixed settings of the reset flow.
#[derive(Debug, Clone, Copy)]
pub struct ResetSettings {
    pub token_ttl: Duration,
}

impl Default for ResetSettings {
    fn default() -> Self {
        Self {
            token_ttl: Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        }
    }
}

pub struct PasswordResetFlow<C> {
    db: DatabaseConnection,
    credentials: C,
    email: Arc<dyn EmailSender>,
    policy: PasswordPolicy,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
    settings: ResetSettings,
}

impl<C: CredentialStore> PasswordResetFlow<C> {
    pub fn new(
        db: DatabaseConnection,
        credentials: C,
        email: Arc<dyn EmailSender>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
        settings: ResetSettings,
    ) -> Self {
        Self {
            db,
            credentials,
            email,
            policy: PasswordPolicy::new(),
            hasher,
            clock,
            settings,
        }
    }

    /// Issue a reset token and mail it.
    ///
    /// Unknown emails succeed silently. If delivery fails the error is
    /// returned but the stored token stays valid.
    #[instrument(skip(self))]
    pub async fn request_reset(&self, email: &str) -> DomainResult<()> {
        let Some(user) = self
            .credentials
            .find_user_basic_by_email(&self.db, email)
            .await?
        else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = PasswordResetToken::issue(user.id, self.clock.now(), self.settings.token_ttl);
        self.credentials.create_reset_token(&self.db, &token).await?;

        self.email
            .send_password_reset_email(&user.email, &token.token)
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Failed to send password reset email");
                DomainError::EmailDelivery(e)
            })?;

        info!(user_id = %user.id, expires_at = %token.expires_at, "Password reset token issued");
        Ok(())
    }

    /// Consume `token` and replace the owner's password.
    ///
    /// Expiry is checked before use, both before any write. A failure to
    /// mark the token used after the password changed is logged only.
    #[instrument(skip(self, token, new_password))]
    pub async fn complete_reset(&self, token: &str, new_password: &str) -> DomainResult<()> {
        self.policy.validate(new_password)?;

        let Some(reset) = self.credentials.find_reset_token(&self.db, token).await? else {
            debug!("Reset rejected: unknown token");
            return Err(DomainError::InvalidToken);
        };

        let now = self.clock.now();
        if reset.is_expired_at(now) {
            debug!(user_id = %reset.user_id, "Reset rejected: token expired");
            return Err(DomainError::TokenExpired);
        }
        if reset.is_used() {
            debug!(user_id = %reset.user_id, "Reset rejected: token already used");
            return Err(DomainError::TokenUsed);
        }

        let digest = self.hasher.hash(new_password).await?;
        self.credentials
            .update_password_hash(&self.db, reset.user_id, &digest, now)
            .await?;

        match self
            .credentials
            .mark_reset_token_used(&self.db, token, self.clock.now())
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(user_id = %reset.user_id, "Reset token was consumed concurrently"),
            Err(e) => error!(
                user_id = %reset.user_id,
                error = %e,
                "Failed to mark reset token used"
            ),
        }

        info!(user_id = %reset.user_id, "Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::application::identity::login::LoginFlow;
    use crate::application::identity::registration::RegistrationOrchestrator;
    use crate::application::identity::test_support::*;
    use crate::auth::PasswordViolation;
    use crate::infrastructure::database::testing::memory_db;
    use crate::infrastructure::SeaOrmUserStore;
    use crate::support::time::FixedClock;

    struct Harness {
        db: DatabaseConnection,
        clock: Arc<FixedClock>,
        mail: Arc<RecordingEmailSender>,
        store: FaultyCredentialStore,
        flow: PasswordResetFlow<FaultyCredentialStore>,
    }

    async fn harness(mail: RecordingEmailSender) -> Harness {
        let db = memory_db().await;
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let mail = Arc::new(mail);
        let store = FaultyCredentialStore::new();

        RegistrationOrchestrator::new(
            db.clone(),
            SeaOrmUserStore::new(),
            store.clone(),
            fast_hasher(),
            clock.clone(),
        )
        .register("a@b.com", "Alice", "Passw0rd!")
        .await
        .unwrap();

        let flow = PasswordResetFlow::new(
            db.clone(),
            store.clone(),
            mail.clone(),
            fast_hasher(),
            clock.clone(),
            ResetSettings::default(),
        );
        Harness { db, clock, mail, store, flow }
    }

    async fn issued_token(h: &Harness) -> String {
        h.flow.request_reset("a@b.com").await.unwrap();
        h.mail.sent().last().unwrap().1.clone()
    }

    async fn login(h: &Harness, password: &str) -> DomainResult<()> {
        LoginFlow::new(h.db.clone(), h.store.clone(), fast_hasher(), test_tokens(), h.clock.clone())
            .authenticate("a@b.com", password)
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn request_persists_and_mails_a_token() {
        let h = harness(RecordingEmailSender::default()).await;
        let token = issued_token(&h).await;

        assert_eq!(h.mail.sent()[0].0, "a@b.com");
        let stored = h.store.find_reset_token(&h.db, &token).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, h.clock.now() + Duration::minutes(20));
        assert!(!stored.is_used());
    }

    #[tokio::test]
    async fn unknown_email_is_a_silent_success() {
        let h = harness(RecordingEmailSender::default()).await;
        h.flow.request_reset("nobody@b.com").await.unwrap();

        assert!(h.mail.sent().is_empty());
        assert_eq!(count_reset_tokens(&h.db).await, 0);
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_but_token_survives() {
        let h = harness(RecordingEmailSender::failing()).await;
        let err = h.flow.request_reset("a@b.com").await.unwrap_err();

        assert!(matches!(err, DomainError::EmailDelivery(_)));
        assert_eq!(count_reset_tokens(&h.db).await, 1);
    }

    #[tokio::test]
    async fn complete_replaces_password_once() {
        let h = harness(RecordingEmailSender::default()).await;
        let token = issued_token(&h).await;

        h.flow.complete_reset(&token, "N3w-Passw0rd!").await.unwrap();
        assert!(matches!(login(&h, "Passw0rd!").await, Err(DomainError::InvalidCredentials)));
        login(&h, "N3w-Passw0rd!").await.unwrap();

        let again = h.flow.complete_reset(&token, "An0ther-one!").await.unwrap_err();
        assert!(matches!(again, DomainError::TokenUsed));
        login(&h, "N3w-Passw0rd!").await.unwrap();
    }

    #[tokio::test]
    async fn token_is_expired_at_its_expiry_instant() {
        let h = harness(RecordingEmailSender::default()).await;
        let token = issued_token(&h).await;

        h.clock.advance(Duration::minutes(20));
        let err = h.flow.complete_reset(&token, "N3w-Passw0rd!").await.unwrap_err();
        assert!(matches!(err, DomainError::TokenExpired));
    }

    #[tokio::test]
    async fn token_is_valid_just_before_expiry() {
        let h = harness(RecordingEmailSender::default()).await;
        let token = issued_token(&h).await;

        h.clock.advance(Duration::minutes(20) - Duration::seconds(1));
        h.flow.complete_reset(&token, "N3w-Passw0rd!").await.unwrap();
    }

    #[tokio::test]
    async fn expiry_is_reported_even_for_used_tokens() {
        let h = harness(RecordingEmailSender::default()).await;
        let token = issued_token(&h).await;
        h.flow.complete_reset(&token, "N3w-Passw0rd!").await.unwrap();

        h.clock.advance(Duration::hours(1));
        let err = h.flow.complete_reset(&token, "An0ther-one!").await.unwrap_err();
        assert!(matches!(err, DomainError::TokenExpired));
    }

    #[tokio::test]
    async fn unknown_token_and_weak_password_are_rejected() {
        let h = harness(RecordingEmailSender::default()).await;
        let token = issued_token(&h).await;

        let err = h.flow.complete_reset("deadbeef", "N3w-Passw0rd!").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidToken));

        let err = h.flow.complete_reset(&token, "short1!").await.unwrap_err();
        assert!(matches!(err, DomainError::PasswordPolicy(PasswordViolation::TooShort)));

        let stored = h.store.find_reset_token(&h.db, &token).await.unwrap().unwrap();
        assert!(!stored.is_used());
        login(&h, "Passw0rd!").await.unwrap();
    }

    #[tokio::test]
    async fn mark_used_failure_keeps_the_new_password() {
        let h = harness(RecordingEmailSender::default()).await;
        let token = issued_token(&h).await;
        h.store.fail_mark_used.store(true, Ordering::SeqCst);

        h.flow.complete_reset(&token, "N3w-Passw0rd!").await.unwrap();
        login(&h, "N3w-Passw0rd!").await.unwrap();
    }
}
