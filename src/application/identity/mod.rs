//! Identity module: registration, login and password reset
//!
//! Each flow is constructed once with its stores and collaborators and is
//! safe to share across concurrent requests.

pub mod login;
pub mod password_reset;
pub mod registration;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use login::{LoginFlow, LoginOutcome};
pub use password_reset::{PasswordResetFlow, ResetSettings, DEFAULT_RESET_TOKEN_TTL_MINUTES};
pub use registration::RegistrationOrchestrator;
pub use service::IdentityServices;
