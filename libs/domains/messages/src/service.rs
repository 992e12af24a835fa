use axum_helpers::{PageParams, Paginated};
use domain_notifications::{NotificationType, Outbox, Outcome, RealtimeEvent, Room, ServerEvent};
use domain_users::Actor;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{MessageError, MessageResult};
use crate::models::{MAX_CONTENT_LEN, Message, TaskThread};
use crate::repository::MessageRepository;

/// Longest message excerpt quoted in a notification
const PREVIEW_CHARS: usize = 80;

pub struct MessageService<R: MessageRepository> {
    repository: Arc<R>,
}

impl<R: MessageRepository> Clone for MessageService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: MessageRepository> MessageService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Post into a task conversation. The counterparty gets a notification
    /// and the task room gets the message pushed live.
    #[instrument(skip(self, content), fields(actor = %actor.id))]
    pub async fn create_message(
        &self,
        actor: &Actor,
        task_id: Uuid,
        content: &str,
    ) -> MessageResult<Outcome<Message>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MessageError::Validation("Message cannot be empty".into()));
        }
        if content.chars().count() > MAX_CONTENT_LEN {
            return Err(MessageError::Validation(format!(
                "Message cannot exceed {} characters",
                MAX_CONTENT_LEN
            )));
        }

        let thread = self.participant_thread(actor, task_id).await?;
        let recipient = thread
            .counterparty(actor.id)
            .ok_or(MessageError::NoCounterparty(task_id))?;

        let message = self
            .repository
            .create(Message::new(task_id, actor.id, content))
            .await?;

        let mut outbox = Outbox::new();
        outbox.notify(
            recipient,
            NotificationType::NewMessage,
            format!("New message on '{}': {}", thread.title, preview(content)),
            format!("/tasks/{}/messages", task_id),
            Some(task_id),
        );
        if let Some(event) =
            RealtimeEvent::serialize(Room::Task(task_id), ServerEvent::ReceiveMessage, &message)
        {
            outbox.broadcast(event);
        }
        Ok(Outcome::with_outbox(message, outbox))
    }

    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn list_messages(
        &self,
        actor: &Actor,
        task_id: Uuid,
        page: PageParams,
    ) -> MessageResult<Paginated<Message>> {
        self.participant_thread(actor, task_id).await?;
        let (messages, total) = self.repository.list(task_id, page).await?;
        Ok(Paginated::new(messages, page, total))
    }

    /// Whether `actor` may subscribe to the realtime room of `task_id`.
    pub async fn authorize_room(&self, actor: &Actor, task_id: Uuid) -> MessageResult<()> {
        self.participant_thread(actor, task_id).await.map(|_| ())
    }

    async fn participant_thread(&self, actor: &Actor, task_id: Uuid) -> MessageResult<TaskThread> {
        let thread = self
            .repository
            .thread(task_id)
            .await?
            .ok_or(MessageError::TaskNotFound(task_id))?;
        if !thread.is_participant(actor.id) {
            return Err(MessageError::Forbidden(
                "Only the task's client and assigned freelancer can access its messages".into(),
            ));
        }
        Ok(thread)
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        content.to_string()
    } else {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryMessageRepository, MockMessageRepository};
    use domain_notifications::Effect;
    use domain_users::Role;

    struct Chat {
        service: MessageService<InMemoryMessageRepository>,
        repository: Arc<InMemoryMessageRepository>,
        client: Actor,
        freelancer: Actor,
        task_id: Uuid,
    }

    async fn chat(assigned: bool) -> Chat {
        let repository = Arc::new(InMemoryMessageRepository::new());
        let client = Actor::new(Uuid::now_v7(), Role::Client);
        let freelancer = Actor::new(Uuid::now_v7(), Role::Freelancer);
        let task_id = Uuid::now_v7();
        repository
            .put_thread(TaskThread {
                task_id,
                title: "Logo".into(),
                client_id: client.id,
                freelancer_id: assigned.then_some(freelancer.id),
            })
            .await;
        Chat {
            service: MessageService::from_shared(repository.clone()),
            repository,
            client,
            freelancer,
            task_id,
        }
    }

    #[tokio::test]
    async fn test_message_notifies_counterparty_and_room() {
        let chat = chat(true).await;
        let (message, outbox) = chat
            .service
            .create_message(&chat.freelancer, chat.task_id, "  first draft is up  ")
            .await
            .unwrap()
            .into_parts();
        assert_eq!(message.content, "first draft is up");
        assert_eq!(message.sender_id, chat.freelancer.id);

        let effects = outbox.effects();
        assert_eq!(effects.len(), 2);
        match &effects[0] {
            Effect::Notify(n) => {
                assert_eq!(n.user_id, chat.client.id);
                assert_eq!(n.notification_type, NotificationType::NewMessage);
            }
            other => panic!("expected a notification, got {:?}", other),
        }
        match &effects[1] {
            Effect::Broadcast(event) => {
                assert_eq!(event.room, Room::Task(chat.task_id));
                assert_eq!(event.event, ServerEvent::ReceiveMessage);
                assert_eq!(event.payload["content"], "first draft is up");
            }
            other => panic!("expected a broadcast, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unassigned_task_has_no_counterparty() {
        let chat = chat(false).await;
        let err = chat
            .service
            .create_message(&chat.client, chat.task_id, "anyone?")
            .await
            .unwrap_err();
        assert!(matches!(err, MessageError::NoCounterparty(_)));
    }

    #[tokio::test]
    async fn test_outsiders_are_refused() {
        let chat = chat(true).await;
        let outsider = Actor::new(Uuid::now_v7(), Role::Admin);

        assert!(matches!(
            chat.service
                .create_message(&outsider, chat.task_id, "hello")
                .await,
            Err(MessageError::Forbidden(_))
        ));
        assert!(matches!(
            chat.service
                .list_messages(&outsider, chat.task_id, PageParams::default())
                .await,
            Err(MessageError::Forbidden(_))
        ));
        assert!(chat.service.authorize_room(&outsider, chat.task_id).await.is_err());
        assert!(chat.service.authorize_room(&chat.client, chat.task_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_content_rules() {
        let chat = chat(true).await;
        assert!(matches!(
            chat.service
                .create_message(&chat.client, chat.task_id, "   ")
                .await,
            Err(MessageError::Validation(_))
        ));
        let long = "a".repeat(MAX_CONTENT_LEN + 1);
        assert!(matches!(
            chat.service.create_message(&chat.client, chat.task_id, &long).await,
            Err(MessageError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_history_is_paginated() {
        let chat = chat(true).await;
        for text in ["one", "two", "three"] {
            chat.service
                .create_message(&chat.client, chat.task_id, text)
                .await
                .unwrap();
        }
        let page = chat
            .service
            .list_messages(&chat.freelancer, chat.task_id, PageParams::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].content, "one");
        assert_eq!(chat.repository.list(chat.task_id, PageParams::default()).await.unwrap().1, 3);
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let mut repository = MockMessageRepository::new();
        repository.expect_thread().returning(|_| Ok(None));
        repository.expect_create().never();
        let service = MessageService::new(repository);

        let actor = Actor::new(Uuid::now_v7(), Role::Client);
        let err = service
            .create_message(&actor, Uuid::now_v7(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, MessageError::TaskNotFound(_)));
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("short"), "short");
        let long = "b".repeat(200);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 1);
    }
}
