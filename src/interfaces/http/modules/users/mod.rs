//! Users module: the authenticated caller's profile

pub mod handlers;

pub use handlers::*;
