use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::mailer::Mailer;
use crate::models::NewNotification;
use crate::outbox::{Effect, EffectHandler, Outbox, RealtimeEvent, Room, ServerEvent};
use crate::repository::NotificationRepository;
use crate::service::NotificationService;

/// Sink for realtime pushes. Delivery is best effort.
pub trait RealtimePublisher: Send + Sync {
    fn publish(&self, event: RealtimeEvent);
}

/// Production [`EffectHandler`].
///
/// Notification rows are written in one batch and each stored row is pushed
/// to its recipient's room. Emails are sent on a spawned task so SMTP latency
/// never reaches the response. Every failure is logged and dropped.
pub struct EffectDispatcher<R: NotificationRepository> {
    notifications: NotificationService<R>,
    mailer: Mailer,
    realtime: Arc<dyn RealtimePublisher>,
}

impl<R: NotificationRepository> EffectDispatcher<R> {
    pub fn new(
        notifications: NotificationService<R>,
        mailer: Mailer,
        realtime: Arc<dyn RealtimePublisher>,
    ) -> Self {
        Self {
            notifications,
            mailer,
            realtime,
        }
    }

    async fn store_and_push(&self, pending: Vec<NewNotification>) {
        let count = pending.len();
        match self.notifications.record(pending).await {
            Ok(created) => {
                for n in created {
                    if let Some(event) = RealtimeEvent::serialize(
                        Room::User(n.user_id),
                        ServerEvent::NewNotification,
                        &n,
                    ) {
                        self.realtime.publish(event);
                    }
                }
            }
            Err(e) => warn!(error = %e, count, "Failed to store notifications"),
        }
    }

    fn send_email(&self, job: crate::outbox::EmailJob) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&job).await {
                warn!(
                    error = %e,
                    kind = job.kind(),
                    provider = mailer.provider_name(),
                    "Failed to send email"
                );
            }
        });
    }
}

#[async_trait]
impl<R: NotificationRepository + 'static> EffectHandler for EffectDispatcher<R> {
    async fn dispatch(&self, outbox: Outbox) {
        debug!(effects = outbox.len(), "Dispatching effects");

        let mut pending = Vec::new();
        for effect in outbox {
            match effect {
                Effect::Notify(n) => pending.push(n),
                Effect::Email(job) => self.send_email(job),
                Effect::Broadcast(event) => self.realtime.publish(event),
            }
        }

        if !pending.is_empty() {
            self.store_and_push(pending).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotificationError, NotificationResult};
    use crate::models::NotificationType;
    use crate::outbox::EmailJob;
    use crate::providers::{EmailContent, EmailProvider, SentEmail};
    use crate::repository::{InMemoryNotificationRepository, MockNotificationRepository};
    use axum_helpers::PageParams;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[derive(Default)]
    struct Published(Mutex<Vec<RealtimeEvent>>);

    impl RealtimePublisher for Published {
        fn publish(&self, event: RealtimeEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    struct ChannelProvider(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl EmailProvider for ChannelProvider {
        async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
            self.0.send(email.to_email.clone()).unwrap();
            Ok(SentEmail::delivered(None))
        }

        fn name(&self) -> &'static str {
            "channel"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmailProvider for FailingProvider {
        async fn send(&self, _email: &EmailContent) -> NotificationResult<SentEmail> {
            Err(NotificationError::ProviderError("smtp down".into()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_notifications_are_stored_then_pushed() {
        let repo = InMemoryNotificationRepository::new();
        let service = NotificationService::new(repo.clone());
        let published = Arc::new(Published::default());
        let dispatcher = EffectDispatcher::new(
            service.clone(),
            Mailer::new(Arc::new(FailingProvider)).unwrap(),
            published.clone(),
        );

        let user = Uuid::now_v7();
        let task = Uuid::now_v7();
        let mut outbox = Outbox::new();
        outbox
            .notify(user, NotificationType::BidAccepted, "Your bid was accepted", "/tasks/x", Some(task))
            .broadcast(RealtimeEvent::new(
                Room::Task(task),
                ServerEvent::ReceiveMessage,
                serde_json::json!({"content": "hi"}),
            ));

        dispatcher.dispatch(outbox).await;

        let page = service
            .list_notifications(user, false, PageParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let events = published.0.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].room, Room::Task(task));
        assert_eq!(events[1].room, Room::User(user));
        assert_eq!(events[1].event, ServerEvent::NewNotification);
    }

    #[tokio::test]
    async fn test_storage_failure_is_swallowed() {
        let mut mock_repo = MockNotificationRepository::new();
        mock_repo
            .expect_insert_many()
            .returning(|_| Err(NotificationError::Internal("db down".into())));

        let published = Arc::new(Published::default());
        let dispatcher = EffectDispatcher::new(
            NotificationService::new(mock_repo),
            Mailer::new(Arc::new(FailingProvider)).unwrap(),
            published.clone(),
        );

        let mut outbox = Outbox::new();
        outbox.notify(Uuid::now_v7(), NotificationType::NewBid, "x", "/", None);
        dispatcher.dispatch(outbox).await;

        assert!(published.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_is_sent_in_background() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = EffectDispatcher::new(
            NotificationService::new(InMemoryNotificationRepository::new()),
            Mailer::new(Arc::new(ChannelProvider(tx))).unwrap(),
            Arc::new(Published::default()),
        );

        let mut outbox = Outbox::new();
        outbox.email(EmailJob::VerifyEmail {
            to: "new@example.com".into(),
            name: "New".into(),
            otp: "123123".into(),
            expires_in_minutes: 10,
        });
        dispatcher.dispatch(outbox).await;

        let to = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(to, "new@example.com");
    }
}
