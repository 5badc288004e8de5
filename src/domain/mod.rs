pub mod credential;
pub mod password_reset;
pub mod ports;
pub mod token;
pub mod user;

pub use credential::{Credential, CredentialStore, CredentialsWithUser};
pub use password_reset::PasswordResetToken;
pub use ports::EmailSender;
pub use token::{TokenClaims, TokenKind, TokenPair};
pub use user::{normalize_email, User, UserBasic, UserRole, UserStatus, UserStore};

/// Anything a store can run statements on: the pool or an open transaction.
pub use sea_orm::ConnectionTrait as Querier;

pub use crate::support::errors::{DomainError, DomainResult};
