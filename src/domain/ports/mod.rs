//! Domain ports
//!
//! Trait contracts for the outside systems the identity flows talk to.

pub mod outbound;

pub use outbound::EmailSender;
