//! Atomic user + credential creation

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{error, info, instrument, warn};

use crate::auth::{PasswordHasher, PasswordPolicy};
use crate::domain::{
    Credential, CredentialStore, DomainError, DomainResult, User, UserRole, UserStore,
};
use crate::support::time::Clock;

/// Creates a user and its credential as one unit.
///
/// Both rows are written on a single transaction that the orchestrator owns.
/// Errors and panics roll it back before surfacing; dropping the returned
/// future mid-flight rolls it back as well.
pub struct RegistrationOrchestrator<U, C> {
    db: DatabaseConnection,
    users: U,
    credentials: C,
    policy: PasswordPolicy,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl<U, C> RegistrationOrchestrator<U, C>
where
    U: UserStore,
    C: CredentialStore,
{
    pub fn new(
        db: DatabaseConnection,
        users: U,
        credentials: C,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db,
            users,
            credentials,
            policy: PasswordPolicy::new(),
            hasher,
            clock,
        }
    }

    #[instrument(skip(self, full_name, password))]
    pub async fn register(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> DomainResult<User> {
        let txn = self.db.begin().await?;

        let outcome = AssertUnwindSafe(self.create_in(&txn, email, full_name, password))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(user)) => {
                txn.commit().await.map_err(|e| {
                    error!(error = %e, "Registration commit failed");
                    DomainError::from(e)
                })?;
                info!(user_id = %user.id, "User registered");
                Ok(user)
            }
            Ok(Err(e)) => {
                rollback(txn).await;
                Err(e)
            }
            Err(panic) => {
                error!("Registration panicked, rolling back");
                rollback(txn).await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn create_in(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> DomainResult<User> {
        let now = self.clock.now();

        let user = User::new(email, full_name, UserRole::User, now)?;
        self.users.create(txn, &user).await?;

        self.policy.validate(password)?;

        let digest = self.hasher.hash(password).await?;
        let credential = Credential::new(user.id, digest, now)?;
        self.credentials.create(txn, &credential).await?;

        Ok(user)
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        warn!(error = %e, "Registration rollback failed");
    }
}
