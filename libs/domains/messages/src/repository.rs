use async_trait::async_trait;
use axum_helpers::PageParams;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{MessageError, MessageResult};
use crate::models::{Message, TaskThread};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Participants of the task the conversation belongs to
    async fn thread(&self, task_id: Uuid) -> MessageResult<Option<TaskThread>>;

    async fn create(&self, message: Message) -> MessageResult<Message>;

    /// One page of a task's messages, oldest first, plus the total count
    async fn list(&self, task_id: Uuid, page: PageParams) -> MessageResult<(Vec<Message>, u64)>;
}

#[derive(Debug, Default)]
struct Store {
    threads: HashMap<Uuid, TaskThread>,
    messages: Vec<Message>,
}

/// In-memory implementation of MessageRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryMessageRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the participants of a task.
    pub async fn put_thread(&self, thread: TaskThread) {
        self.store
            .write()
            .await
            .threads
            .insert(thread.task_id, thread);
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn thread(&self, task_id: Uuid) -> MessageResult<Option<TaskThread>> {
        Ok(self.store.read().await.threads.get(&task_id).cloned())
    }

    async fn create(&self, message: Message) -> MessageResult<Message> {
        let mut store = self.store.write().await;
        if !store.threads.contains_key(&message.task_id) {
            return Err(MessageError::TaskNotFound(message.task_id));
        }
        store.messages.push(message.clone());
        Ok(message)
    }

    async fn list(&self, task_id: Uuid, page: PageParams) -> MessageResult<(Vec<Message>, u64)> {
        let store = self.store.read().await;
        let mut messages: Vec<&Message> = store
            .messages
            .iter()
            .filter(|m| m.task_id == task_id)
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));

        let total = messages.len() as u64;
        let items = messages
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_pages_oldest_first() {
        let repo = InMemoryMessageRepository::new();
        let task_id = Uuid::now_v7();
        let client = Uuid::now_v7();
        repo.put_thread(TaskThread {
            task_id,
            title: "Logo".into(),
            client_id: client,
            freelancer_id: None,
        })
        .await;

        for i in 0..5 {
            repo.create(Message::new(task_id, client, format!("m{}", i)))
                .await
                .unwrap();
        }

        let (page, total) = repo.list(task_id, PageParams::new(2, 2)).await.unwrap();
        assert_eq!(total, 5);
        let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["m2", "m3"]);
    }

    #[tokio::test]
    async fn test_create_needs_known_task() {
        let repo = InMemoryMessageRepository::new();
        let err = repo
            .create(Message::new(Uuid::now_v7(), Uuid::now_v7(), "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, MessageError::TaskNotFound(_)));
    }
}
