//! Authentication primitives
//!
//! Password policy, password hashing and signed token pairs. These hold no
//! per-call state and are shared by every identity flow.

pub mod jwt;
pub mod password;
pub mod password_policy;

pub use jwt::TokenService;
pub use password::PasswordHasher;
pub use password_policy::{PasswordPolicy, PasswordViolation};
