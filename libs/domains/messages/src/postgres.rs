use async_trait::async_trait;
use axum_helpers::PageParams;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{MessageError, MessageResult},
    models::{Message, TaskThread},
    repository::MessageRepository,
};

#[derive(Clone)]
pub struct PgMessageRepository {
    db: DatabaseConnection,
}

impl PgMessageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_insert_err(err: DbErr, task_id: Uuid) -> MessageError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => MessageError::TaskNotFound(task_id),
        _ => err.into(),
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn thread(&self, task_id: Uuid) -> MessageResult<Option<TaskThread>> {
        let row = self
            .db
            .query_one_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT id, title, client_id, freelancer_id FROM tasks WHERE id = $1",
                [task_id.into()],
            ))
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(TaskThread {
            task_id: row.try_get("", "id")?,
            title: row.try_get("", "title")?,
            client_id: row.try_get("", "client_id")?,
            freelancer_id: row.try_get("", "freelancer_id")?,
        }))
    }

    async fn create(&self, message: Message) -> MessageResult<Message> {
        let task_id = message.task_id;
        let model = entity::ActiveModel::from(message)
            .insert(&self.db)
            .await
            .map_err(|e| map_insert_err(e, task_id))?;

        tracing::debug!(message_id = %model.id, task_id = %task_id, "Stored message");
        Ok(model.into())
    }

    async fn list(&self, task_id: Uuid, page: PageParams) -> MessageResult<(Vec<Message>, u64)> {
        let query = entity::Entity::find().filter(entity::Column::TaskId.eq(task_id));

        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_asc(entity::Column::CreatedAt)
            .order_by_asc(entity::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }
}
