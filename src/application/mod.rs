pub mod identity;

pub use identity::{
    IdentityServices, LoginFlow, LoginOutcome, PasswordResetFlow, RegistrationOrchestrator,
    ResetSettings, DEFAULT_RESET_TOKEN_TTL_MINUTES,
};
