//! Credential aggregate
//!
//! The password record linked one-to-one with a user, plus the store
//! interface used by registration, login and password reset.

pub mod model;
pub mod repository;

pub use model::{Credential, CredentialsWithUser};
pub use repository::CredentialStore;
