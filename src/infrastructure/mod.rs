//! Infrastructure layer - external concerns

pub mod database;
pub mod email;

pub use database::repositories::{SeaOrmCredentialStore, SeaOrmUserStore};
pub use database::{init_database, DatabaseConfig};
pub use email::{LogEmailSender, ResendEmailSender};
