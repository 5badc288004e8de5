//! Database store implementations
//!
//! Stores are stateless and generic over the connection, so the same value
//! serves the pool and any open transaction.

pub mod credential_repository;
pub mod user_repository;

pub use credential_repository::SeaOrmCredentialStore;
pub use user_repository::SeaOrmUserStore;

use sea_orm::{DbErr, SqlErr};
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};
use crate::support::errors::InfraError;

fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(InfraError::Database(e))
}

/// Driver-reported unique violation (SQLite 2067/1555, Postgres 23505).
fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn parse_id(raw: &str, column: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        DomainError::Storage(InfraError::CorruptRecord(format!(
            "{} is not a uuid",
            column
        )))
    })
}
