//! Database entities module

pub mod auth_credential;
pub mod password_reset_token;
pub mod user;

pub use auth_credential::Entity as AuthCredential;
pub use password_reset_token::Entity as PasswordResetToken;
pub use user::Entity as User;
