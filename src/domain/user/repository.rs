use async_trait::async_trait;
use uuid::Uuid;

use super::User;
use crate::domain::{DomainResult, Querier};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A taken email yields `DuplicateEmail`.
    async fn create<C: Querier>(&self, db: &C, user: &User) -> DomainResult<()>;

    async fn find_by_id<C: Querier>(&self, db: &C, id: Uuid) -> DomainResult<Option<User>>;

    async fn find_by_email<C: Querier>(&self, db: &C, email: &str) -> DomainResult<Option<User>>;
}
