use crate::models::Message;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub task_id: Uuid,
    pub sender_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Message {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            sender_id: model.sender_id,
            content: model.content,
            created_at: model.created_at.into(),
        }
    }
}

impl From<Message> for ActiveModel {
    fn from(message: Message) -> Self {
        ActiveModel {
            id: Set(message.id),
            task_id: Set(message.task_id),
            sender_id: Set(message.sender_id),
            content: Set(message.content),
            created_at: Set(message.created_at.into()),
        }
    }
}
