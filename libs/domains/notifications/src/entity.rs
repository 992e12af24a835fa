use crate::models::{Notification, NotificationType};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub url: String,
    pub task_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Notification {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            notification_type: model.notification_type,
            message: model.message,
            url: model.url,
            task_id: model.task_id,
            is_read: model.is_read,
            created_at: model.created_at.into(),
        }
    }
}

impl From<Notification> for ActiveModel {
    fn from(n: Notification) -> Self {
        ActiveModel {
            id: Set(n.id),
            user_id: Set(n.user_id),
            notification_type: Set(n.notification_type),
            message: Set(n.message),
            url: Set(n.url),
            task_id: Set(n.task_id),
            is_read: Set(n.is_read),
            created_at: Set(n.created_at.into()),
        }
    }
}
