//! Email + password login

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::auth::{PasswordHasher, TokenService};
use crate::domain::{
    CredentialStore, DomainError, DomainResult, TokenClaims, TokenPair, User,
};
use crate::support::time::Clock;

/// Hashed on first use so unknown emails cost as much as wrong passwords.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing!1";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: User,
}

pub struct LoginFlow<C> {
    db: DatabaseConnection,
    credentials: C,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    clock: Arc<dyn Clock>,
    dummy_digest: OnceCell<String>,
}

impl<C: CredentialStore> LoginFlow<C> {
    pub fn new(
        db: DatabaseConnection,
        credentials: C,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            credentials,
            hasher,
            tokens,
            clock,
            dummy_digest: OnceCell::new(),
        }
    }

    /// Verify `email`/`password` and issue a token pair.
    ///
    /// Unknown email, wrong password and inactive account all yield
    /// `InvalidCredentials`. Login bookkeeping is best-effort: once tokens
    /// are issued a failed write is logged, not returned.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> DomainResult<LoginOutcome> {
        let Some(found) = self.credentials.find_by_email_with_user(&self.db, email).await? else {
            self.burn_verify(password).await;
            debug!("Login failed: unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        let user_id = found.user.id;
        let matched = self
            .hasher
            .verify(password, &found.credential.password_hash)
            .await?;

        if !matched {
            debug!(%user_id, "Login failed: password mismatch");
            if let Err(e) = self
                .credentials
                .record_failed_attempt(&self.db, user_id, self.clock.now())
                .await
            {
                warn!(%user_id, error = %e, "Failed to record failed login attempt");
            }
            return Err(DomainError::InvalidCredentials);
        }

        if !found.user.is_active() {
            debug!(%user_id, status = found.user.status.as_str(), "Login failed: inactive account");
            return Err(DomainError::InvalidCredentials);
        }

        let tokens = self.tokens.issue_pair(&TokenClaims::from(&found.user))?;

        if let Err(e) = self
            .credentials
            .record_login(&self.db, user_id, self.clock.now())
            .await
        {
            warn!(%user_id, error = %e, "Failed to record login");
        }

        info!(%user_id, "User logged in");
        Ok(LoginOutcome {
            tokens,
            user: found.user,
        })
    }

    async fn burn_verify(&self, password: &str) {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
            .await;
        if let Ok(digest) = digest {
            let _ = self.hasher.verify(password, digest).await;
        }
    }
}
