//! # Identity core
//!
//! Registration, login and password reset for a user-facing service.
//!
//! ## Architecture
//!
//! - **domain**: entities, store traits and outbound ports
//! - **auth**: password policy, bcrypt hashing and JWT token pairs
//! - **application**: registration, login and password reset flows
//! - **infrastructure**: SeaORM persistence and email delivery
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: process lifecycle shared by the CLI
//! - **support**: errors, clocks and graceful shutdown

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod support;

pub use config::{default_config_path, AppConfig};

pub use application::IdentityServices;
pub use auth::{PasswordHasher, PasswordPolicy, TokenService};
pub use infrastructure::{init_database, DatabaseConfig};
pub use interfaces::http::create_api_router;
