use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::user_repository::user_model_to_domain;
use super::{db_err, parse_id};
use crate::domain::{
    normalize_email, Credential, CredentialStore, CredentialsWithUser, DomainError, DomainResult,
    PasswordResetToken, Querier, UserBasic,
};
use crate::infrastructure::database::entities::{auth_credential, password_reset_token, user};
use crate::support::errors::InfraError;

/// SeaORM-backed [`CredentialStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmCredentialStore;

impl SeaOrmCredentialStore {
    pub fn new() -> Self {
        Self
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn credential_model_to_domain(model: auth_credential::Model) -> DomainResult<Credential> {
    Ok(Credential {
        id: parse_id(&model.id, "auth_credentials.id")?,
        user_id: parse_id(&model.user_id, "auth_credentials.user_id")?,
        password_hash: model.password_hash,
        last_login: model.last_login,
        failed_attempts: model.failed_attempts,
        locked_until: model.locked_until,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn reset_token_model_to_domain(
    model: password_reset_token::Model,
) -> DomainResult<PasswordResetToken> {
    Ok(PasswordResetToken {
        id: parse_id(&model.id, "password_reset_tokens.id")?,
        user_id: parse_id(&model.user_id, "password_reset_tokens.user_id")?,
        token: model.token,
        expires_at: model.expires_at,
        used_at: model.used_at,
        created_at: model.created_at,
    })
}

// ── Store implementation ────────────────────────────────────────

#[async_trait]
impl CredentialStore for SeaOrmCredentialStore {
    async fn create<C: Querier>(&self, db: &C, credential: &Credential) -> DomainResult<()> {
        let model = auth_credential::ActiveModel {
            id: Set(credential.id.to_string()),
            user_id: Set(credential.user_id.to_string()),
            password_hash: Set(credential.password_hash.clone()),
            last_login: Set(credential.last_login),
            failed_attempts: Set(credential.failed_attempts),
            locked_until: Set(credential.locked_until),
            created_at: Set(credential.created_at),
            updated_at: Set(credential.updated_at),
        };
        model.insert(db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_email_with_user<C: Querier>(
        &self,
        db: &C,
        email: &str,
    ) -> DomainResult<Option<CredentialsWithUser>> {
        let row = auth_credential::Entity::find()
            .find_also_related(user::Entity)
            .filter(user::Column::Email.eq(normalize_email(email)))
            .filter(user::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(db_err)?;

        let Some((credential, Some(owner))) = row else {
            return Ok(None);
        };

        Ok(Some(CredentialsWithUser {
            credential: credential_model_to_domain(credential)?,
            user: user_model_to_domain(owner)?,
        }))
    }

    async fn record_login<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        auth_credential::Entity::update_many()
            .col_expr(auth_credential::Column::LastLogin, Expr::value(Some(at)))
            .col_expr(auth_credential::Column::FailedAttempts, Expr::value(0))
            .col_expr(auth_credential::Column::UpdatedAt, Expr::value(at))
            .filter(auth_credential::Column::UserId.eq(user_id.to_string()))
            .exec(db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn record_failed_attempt<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        auth_credential::Entity::update_many()
            .col_expr(
                auth_credential::Column::FailedAttempts,
                Expr::col(auth_credential::Column::FailedAttempts).add(1),
            )
            .col_expr(auth_credential::Column::UpdatedAt, Expr::value(at))
            .filter(auth_credential::Column::UserId.eq(user_id.to_string()))
            .exec(db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn create_reset_token<C: Querier>(
        &self,
        db: &C,
        token: &PasswordResetToken,
    ) -> DomainResult<()> {
        let model = password_reset_token::ActiveModel {
            id: Set(token.id.to_string()),
            user_id: Set(token.user_id.to_string()),
            token: Set(token.token.clone()),
            expires_at: Set(token.expires_at),
            used_at: Set(token.used_at),
            created_at: Set(token.created_at),
        };
        model.insert(db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_reset_token<C: Querier>(
        &self,
        db: &C,
        token: &str,
    ) -> DomainResult<Option<PasswordResetToken>> {
        let model = password_reset_token::Entity::find()
            .filter(password_reset_token::Column::Token.eq(token))
            .one(db)
            .await
            .map_err(db_err)?;

        model.map(reset_token_model_to_domain).transpose()
    }

    async fn mark_reset_token_used<C: Querier>(
        &self,
        db: &C,
        token: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = password_reset_token::Entity::update_many()
            .col_expr(password_reset_token::Column::UsedAt, Expr::value(Some(at)))
            .filter(password_reset_token::Column::Token.eq(token))
            .filter(password_reset_token::Column::UsedAt.is_null())
            .exec(db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }

    async fn update_password_hash<C: Querier>(
        &self,
        db: &C,
        user_id: Uuid,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        if password_hash.is_empty() {
            return Err(DomainError::Storage(InfraError::CorruptRecord(
                "refusing to store an empty password hash".to_string(),
            )));
        }

        let result = auth_credential::Entity::update_many()
            .col_expr(auth_credential::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(auth_credential::Column::UpdatedAt, Expr::value(at))
            .filter(auth_credential::Column::UserId.eq(user_id.to_string()))
            .exec(db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::UserNotFound);
        }
        Ok(())
    }

    async fn find_user_basic_by_email<C: Querier>(
        &self,
        db: &C,
        email: &str,
    ) -> DomainResult<Option<UserBasic>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .filter(user::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(db_err)?;

        match model {
            Some(model) => Ok(Some(UserBasic {
                id: parse_id(&model.id, "users.id")?,
                email: model.email,
            })),
            None => Ok(None),
        }
    }
}
