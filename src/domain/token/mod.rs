//! Token payloads shared by the token service and the flows

pub mod model;

pub use model::{TokenClaims, TokenKind, TokenPair};
