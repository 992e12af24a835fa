use async_trait::async_trait;
use axum_helpers::PageParams;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{NotificationError, NotificationResult},
    models::{NewNotification, Notification},
    repository::NotificationRepository,
};

#[derive(Clone)]
pub struct PgNotificationRepository {
    db: DatabaseConnection,
}

impl PgNotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: sea_orm::DbErr) -> NotificationError {
    NotificationError::Internal(format!("Database error: {}", e))
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert_many(&self, batch: Vec<NewNotification>) -> NotificationResult<Vec<Notification>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let created: Vec<Notification> = batch
            .into_iter()
            .map(NewNotification::into_notification)
            .collect();
        let models: Vec<entity::ActiveModel> =
            created.iter().cloned().map(Into::into).collect();

        entity::Entity::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        tracing::debug!(count = created.len(), "Stored notifications");
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> NotificationResult<Option<Notification>> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(Into::into))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageParams,
    ) -> NotificationResult<(Vec<Notification>, u64)> {
        let mut query = entity::Entity::find().filter(entity::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(entity::Column::IsRead.eq(false));
        }

        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let models = query
            .order_by_desc(entity::Column::CreatedAt)
            .order_by_desc(entity::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn count_unread(&self, user_id: Uuid) -> NotificationResult<u64> {
        entity::Entity::find()
            .filter(entity::Column::UserId.eq(user_id))
            .filter(entity::Column::IsRead.eq(false))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn mark_read(&self, id: Uuid) -> NotificationResult<Option<Notification>> {
        entity::Entity::update_many()
            .col_expr(entity::Column::IsRead, Expr::value(true))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        self.get_by_id(id).await
    }

    async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64> {
        let result = entity::Entity::update_many()
            .col_expr(entity::Column::IsRead, Expr::value(true))
            .filter(entity::Column::UserId.eq(user_id))
            .filter(entity::Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected)
    }
}
