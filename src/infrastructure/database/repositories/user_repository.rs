use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::debug;
use uuid::Uuid;

use super::{db_err, is_unique_violation, parse_id};
use crate::domain::{
    normalize_email, DomainError, DomainResult, Querier, User, UserRole, UserStatus, UserStore,
};
use crate::infrastructure::database::entities::user;

/// SeaORM-backed [`UserStore`]. Stateless; the connection comes with each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmUserStore;

impl SeaOrmUserStore {
    pub fn new() -> Self {
        Self
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::User => user::UserRole::User,
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Therapist => user::UserRole::Therapist,
    }
}

fn role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::User => UserRole::User,
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Therapist => UserRole::Therapist,
    }
}

fn status_to_entity(status: UserStatus) -> user::UserStatus {
    match status {
        UserStatus::Active => user::UserStatus::Active,
        UserStatus::Suspended => user::UserStatus::Suspended,
        UserStatus::Deleted => user::UserStatus::Deleted,
    }
}

fn status_to_domain(status: user::UserStatus) -> UserStatus {
    match status {
        user::UserStatus::Active => UserStatus::Active,
        user::UserStatus::Suspended => UserStatus::Suspended,
        user::UserStatus::Deleted => UserStatus::Deleted,
    }
}

pub(super) fn user_model_to_domain(model: user::Model) -> DomainResult<User> {
    Ok(User {
        id: parse_id(&model.id, "users.id")?,
        email: model.email,
        full_name: model.full_name,
        role: role_to_domain(model.role),
        status: status_to_domain(model.status),
        email_verified_at: model.email_verified_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    })
}

// ── Store implementation ────────────────────────────────────────

#[async_trait]
impl UserStore for SeaOrmUserStore {
    async fn create<C: Querier>(&self, db: &C, user: &User) -> DomainResult<()> {
        let model = user::ActiveModel {
            id: Set(user.id.to_string()),
            email: Set(normalize_email(&user.email)),
            full_name: Set(user.full_name.clone()),
            role: Set(role_to_entity(user.role)),
            status: Set(status_to_entity(user.status)),
            email_verified_at: Set(user.email_verified_at),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
            deleted_at: Set(user.deleted_at),
        };

        model.insert(db).await.map_err(|e| {
            if is_unique_violation(&e) {
                debug!(user_id = %user.id, "User insert hit unique email constraint");
                DomainError::DuplicateEmail
            } else {
                db_err(e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id<C: Querier>(&self, db: &C, id: Uuid) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id.to_string())
            .filter(user::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(db_err)?;

        model.map(user_model_to_domain).transpose()
    }

    async fn find_by_email<C: Querier>(&self, db: &C, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .filter(user::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(db_err)?;

        model.map(user_model_to_domain).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::testing::memory_db;
    use chrono::Utc;
    use sea_orm::{PaginatorTrait, TransactionTrait};

    fn alice() -> User {
        User::new("Alice@Example.com", "Alice", UserRole::User, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn create_and_find() {
        let db = memory_db().await;
        let store = SeaOrmUserStore::new();
        let user = alice();
        store.create(&db, &user).await.unwrap();

        let by_id = store.find_by_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");
        assert_eq!(by_id.role, UserRole::User);

        let by_email = store.find_by_email(&db, "ALICE@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
        assert!(store.find_by_email(&db, "bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let db = memory_db().await;
        let store = SeaOrmUserStore::new();
        store.create(&db, &alice()).await.unwrap();

        let err = store.create(&db, &alice()).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEmail));
    }

    #[tokio::test]
    async fn soft_deleted_users_are_invisible() {
        let db = memory_db().await;
        let store = SeaOrmUserStore::new();
        let mut user = alice();
        user.deleted_at = Some(Utc::now());
        user.status = UserStatus::Deleted;
        store.create(&db, &user).await.unwrap();

        assert!(store.find_by_id(&db, user.id).await.unwrap().is_none());
        assert!(store.find_by_email(&db, &user.email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn writes_inside_a_rolled_back_transaction_vanish() {
        let db = memory_db().await;
        let store = SeaOrmUserStore::new();

        let txn = db.begin().await.unwrap();
        store.create(&txn, &alice()).await.unwrap();
        txn.rollback().await.unwrap();

        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 0);
    }
}
