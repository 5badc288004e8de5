use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::user::User;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
    pub failed_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// New credential for `user_id`. The hash must not be empty.
    pub fn new(user_id: Uuid, password_hash: String, now: DateTime<Utc>) -> DomainResult<Self> {
        if password_hash.is_empty() {
            return Err(DomainError::validation(
                "password",
                "password hash cannot be empty",
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            password_hash,
            last_login: None,
            failed_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Result of the login lookup: credential joined with its owner.
#[derive(Debug, Clone)]
pub struct CredentialsWithUser {
    pub credential: Credential,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_credential_starts_clean() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let credential = Credential::new(user_id, "$2b$04$digest".into(), now).unwrap();
        assert_eq!(credential.user_id, user_id);
        assert_eq!(credential.failed_attempts, 0);
        assert!(credential.last_login.is_none());
        assert!(credential.locked_until.is_none());
    }

    #[test]
    fn empty_hash_is_rejected() {
        let err = Credential::new(Uuid::new_v4(), String::new(), Utc::now()).unwrap_err();
        assert_eq!(err.field(), Some("password"));
    }
}
