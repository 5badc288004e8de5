//! Authentication module: register, login, refresh, password reset

pub mod dto;
pub mod handlers;
pub mod page;

pub use dto::*;
pub use handlers::*;
