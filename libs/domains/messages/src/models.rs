use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MAX_CONTENT_LEN: usize = 5000;

/// A chat line inside a task's conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub id: Uuid,
    pub task_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(task_id: Uuid, sender_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            task_id,
            sender_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMessage {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// The two parties of a task conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskThread {
    pub task_id: Uuid,
    pub title: String,
    pub client_id: Uuid,
    pub freelancer_id: Option<Uuid>,
}

impl TaskThread {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.freelancer_id == Some(user_id)
    }

    /// The other side of the conversation, if one has been assigned.
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if self.client_id == user_id {
            self.freelancer_id
        } else if self.freelancer_id == Some(user_id) {
            Some(self.client_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counterparty() {
        let client = Uuid::now_v7();
        let freelancer = Uuid::now_v7();
        let mut thread = TaskThread {
            task_id: Uuid::now_v7(),
            title: "Logo".into(),
            client_id: client,
            freelancer_id: None,
        };
        assert_eq!(thread.counterparty(client), None);

        thread.freelancer_id = Some(freelancer);
        assert_eq!(thread.counterparty(client), Some(freelancer));
        assert_eq!(thread.counterparty(freelancer), Some(client));
        assert_eq!(thread.counterparty(Uuid::now_v7()), None);
    }

    #[test]
    fn test_content_length_is_validated() {
        let too_long = CreateMessage {
            content: "x".repeat(MAX_CONTENT_LEN + 1),
        };
        assert!(too_long.validate().is_err());
        assert!(CreateMessage { content: "".into() }.validate().is_err());
        assert!(CreateMessage { content: "hi".into() }.validate().is_ok());
    }
}
