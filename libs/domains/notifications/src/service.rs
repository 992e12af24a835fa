use axum_helpers::{PageParams, Paginated};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{NewNotification, Notification};
use crate::repository::NotificationRepository;

/// Service layer for notification reads and the read flag
#[derive(Clone)]
pub struct NotificationService<R: NotificationRepository> {
    repository: Arc<R>,
}

impl<R: NotificationRepository> NotificationService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Persist notifications produced by other services
    pub async fn record(&self, batch: Vec<NewNotification>) -> NotificationResult<Vec<Notification>> {
        self.repository.insert_many(batch).await
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageParams,
    ) -> NotificationResult<Paginated<Notification>> {
        let (items, total) = self
            .repository
            .list_for_user(user_id, unread_only, page)
            .await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> NotificationResult<u64> {
        self.repository.count_unread(user_id).await
    }

    /// Mark one notification read. Only its recipient may do this.
    #[instrument(skip(self), fields(user_id = %user_id, notification_id = %id))]
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> NotificationResult<Notification> {
        let notification = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(NotificationError::NotFound(id))?;

        if notification.user_id != user_id {
            return Err(NotificationError::Forbidden(id));
        }
        if notification.is_read {
            return Ok(notification);
        }

        self.repository
            .mark_read(id)
            .await?
            .ok_or(NotificationError::NotFound(id))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64> {
        let updated = self.repository.mark_all_read(user_id).await?;
        tracing::debug!(user_id = %user_id, updated, "Marked notifications read");
        Ok(updated)
    }
}
