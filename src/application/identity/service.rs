//! Identity use-cases bundled for the transport layer
//!
//! Handlers hold one `IdentityServices` and delegate to it; every flow is
//! built once here with its dependencies and shared across requests.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::login::{LoginFlow, LoginOutcome};
use super::password_reset::{PasswordResetFlow, ResetSettings};
use super::registration::RegistrationOrchestrator;
use crate::auth::{PasswordHasher, TokenService};
use crate::domain::{
    CredentialStore, DomainError, DomainResult, EmailSender, TokenClaims, TokenPair, User,
    UserStore,
};
use crate::support::time::Clock;

pub struct IdentityServices<U, C> {
    db: DatabaseConnection,
    users: U,
    tokens: Arc<TokenService>,
    registration: RegistrationOrchestrator<U, C>,
    login: LoginFlow<C>,
    password_reset: PasswordResetFlow<C>,
}

impl<U, C> IdentityServices<U, C>
where
    U: UserStore + Clone,
    C: CredentialStore + Clone,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: DatabaseConnection,
        users: U,
        credentials: C,
        hasher: PasswordHasher,
        tokens: TokenService,
        email: Arc<dyn EmailSender>,
        reset: ResetSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            registration: RegistrationOrchestrator::new(
                db.clone(),
                users.clone(),
                credentials.clone(),
                hasher,
                clock.clone(),
            ),
            login: LoginFlow::new(
                db.clone(),
                credentials.clone(),
                hasher,
                tokens.clone(),
                clock.clone(),
            ),
            password_reset: PasswordResetFlow::new(
                db.clone(),
                credentials,
                email,
                hasher,
                clock,
                reset,
            ),
            db,
            users,
            tokens,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn register(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> DomainResult<User> {
        self.registration.register(email, full_name, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> DomainResult<LoginOutcome> {
        self.login.authenticate(email, password).await
    }

    pub fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        self.tokens.refresh_pair(refresh_token)
    }

    pub fn validate_access(&self, access_token: &str) -> DomainResult<TokenClaims> {
        self.tokens.validate_access(access_token)
    }

    pub async fn request_password_reset(&self, email: &str) -> DomainResult<()> {
        self.password_reset.request_reset(email).await
    }

    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        self.password_reset.complete_reset(token, new_password).await
    }

    /// Profile of the caller identified by an access token.
    pub async fn current_user(&self, user_id: Uuid) -> DomainResult<User> {
        self.users
            .find_by_id(&self.db, user_id)
            .await?
            .ok_or(DomainError::UserNotFound)
    }
}
