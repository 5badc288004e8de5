//! User aggregate
//!
//! Owned by user management; the identity core only creates it during
//! registration and reads it back by id or email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::domain::{DomainError, DomainResult};

pub const MIN_FULL_NAME_LENGTH: usize = 2;
pub const MAX_FULL_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    Therapist,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Therapist => "therapist",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
    Deleted,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Always lower-case
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a new active user, validating email and full name.
    pub fn new(
        email: &str,
        full_name: &str,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("email", "email cannot be empty"));
        }
        if !email.validate_email() {
            return Err(DomainError::validation("email", "invalid email"));
        }

        if full_name.trim().is_empty() {
            return Err(DomainError::validation(
                "full_name",
                "full name cannot be empty",
            ));
        }
        let name_len = full_name.chars().count();
        if !(MIN_FULL_NAME_LENGTH..=MAX_FULL_NAME_LENGTH).contains(&name_len) {
            return Err(DomainError::validation(
                "full_name",
                format!(
                    "full name must be {}-{} characters",
                    MIN_FULL_NAME_LENGTH, MAX_FULL_NAME_LENGTH
                ),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            full_name: full_name.to_string(),
            role,
            status: UserStatus::Active,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active && self.deleted_at.is_none()
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal user projection used by the password reset request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBasic {
    pub id: Uuid,
    pub email: String,
}
