//! Password complexity rules

use thiserror::Error;

/// Characters that satisfy the special-character rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// First rule a candidate password broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordViolation {
    #[error("password must be at least 8 characters")]
    TooShort,
    #[error("password must contain at least one number")]
    MissingDigit,
    #[error("password must contain at least one special character")]
    MissingSpecialChar,
}

/// Stateless password strength validator.
///
/// Rules run in a fixed order and the first failure is reported. The upper
/// bound on length is enforced by [`PasswordHasher`](super::PasswordHasher).
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, password: &str) -> Result<(), PasswordViolation> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordViolation::TooShort);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordViolation::MissingDigit);
        }
        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            return Err(PasswordViolation::MissingSpecialChar);
        }
        Ok(())
    }
}
