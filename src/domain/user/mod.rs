//! User aggregate
//!
//! Contains the User entity and its store interface.

pub mod model;
pub mod repository;

pub use model::{normalize_email, User, UserBasic, UserRole, UserStatus};
pub use repository::UserStore;
