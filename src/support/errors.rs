use thiserror::Error;

use crate::auth::password_policy::PasswordViolation;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation: {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error(transparent)]
    PasswordPolicy(#[from] PasswordViolation),

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password reset token has expired")]
    TokenExpired,

    #[error("Password reset token has already been used")]
    TokenUsed,

    #[error("User not found")]
    UserNotFound,

    #[error("Failed to sign token")]
    Signing,

    #[error("Failed to deliver email")]
    EmailDelivery(#[source] InfraError),

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,

    #[error("Storage failure")]
    Storage(#[source] InfraError),
}

impl DomainError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Field the caller has to correct, for input errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::PasswordPolicy(_) => Some("password"),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Storage(InfraError::Database(e))
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Email provider error: {0}")]
    Email(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
