use async_trait::async_trait;
use axum_helpers::PageParams;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{profile, user};
use crate::error::{UserError, UserResult, map_write_err};
use crate::models::{Profile, User, UserFilter, UserQuery};
use crate::repository::UserRepository;

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn apply_query(mut select: Select<user::Entity>, query: &UserQuery) -> Select<user::Entity> {
    for filter in &query.filters {
        select = match filter {
            UserFilter::Role(role) => select.filter(user::Column::Role.eq(*role)),
            UserFilter::Suspended(s) => select.filter(user::Column::IsSuspended.eq(*s)),
            UserFilter::EmailContains(needle) => {
                select.filter(user::Column::Email.contains(needle.to_lowercase()))
            }
        };
    }
    select
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User, profile: Profile) -> UserResult<User> {
        let email = user.email.clone();
        let txn = self.db.begin().await?;

        let model = user::Entity::insert(user::ActiveModel::from(user))
            .exec_with_returning(&txn)
            .await
            .map_err(|e| map_write_err(e, &email))?;
        profile::Entity::insert(profile::ActiveModel::from(profile))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(user_id = %model.id, role = %model.role, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let id = user.id;
        let email = user.email.clone();
        let model = user::ActiveModel::from(user)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => UserError::NotFound(id),
                other => map_write_err(other, &email),
            })?;
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = user::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(result.rows_affected > 0)
    }

    async fn list(&self, query: UserQuery, page: PageParams) -> UserResult<(Vec<User>, u64)> {
        let select = apply_query(user::Entity::find(), &query);
        let total = select.clone().count(&self.db).await?;

        let models = select
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn get_profile(&self, user_id: Uuid) -> UserResult<Option<Profile>> {
        let model = profile::Entity::find_by_id(user_id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn update_profile(&self, profile: Profile) -> UserResult<Profile> {
        let user_id = profile.user_id;
        let model = profile::ActiveModel::from(profile)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                sea_orm::DbErr::RecordNotUpdated => UserError::NotFound(user_id),
                other => other.into(),
            })?;
        Ok(model.into())
    }
}
