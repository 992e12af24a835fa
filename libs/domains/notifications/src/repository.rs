use async_trait::async_trait;
use axum_helpers::PageParams;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::NotificationResult;
use crate::models::{NewNotification, Notification};

/// Repository trait for Notification persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Store a batch of notifications, returning them in input order
    async fn insert_many(&self, batch: Vec<NewNotification>) -> NotificationResult<Vec<Notification>>;

    async fn get_by_id(&self, id: Uuid) -> NotificationResult<Option<Notification>>;

    /// Newest first, with the total number of matching rows
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageParams,
    ) -> NotificationResult<(Vec<Notification>, u64)>;

    async fn count_unread(&self, user_id: Uuid) -> NotificationResult<u64>;

    async fn mark_read(&self, id: Uuid) -> NotificationResult<Option<Notification>>;

    /// Returns how many rows changed
    async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64>;
}

/// In-memory implementation of NotificationRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<HashMap<Uuid, Notification>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert_many(&self, batch: Vec<NewNotification>) -> NotificationResult<Vec<Notification>> {
        let mut notifications = self.notifications.write().await;

        let created: Vec<Notification> = batch
            .into_iter()
            .map(NewNotification::into_notification)
            .collect();
        for n in &created {
            notifications.insert(n.id, n.clone());
        }

        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> NotificationResult<Option<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications.get(&id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageParams,
    ) -> NotificationResult<(Vec<Notification>, u64)> {
        let notifications = self.notifications.read().await;

        let mut result: Vec<Notification> = notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();

        // v7 ids are time ordered, so they break created_at ties
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = result.len() as u64;
        let items = result
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok((items, total))
    }

    async fn count_unread(&self, user_id: Uuid) -> NotificationResult<u64> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, id: Uuid) -> NotificationResult<Option<Notification>> {
        let mut notifications = self.notifications.write().await;
        Ok(notifications.get_mut(&id).map(|n| {
            n.is_read = true;
            n.clone()
        }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64> {
        let mut notifications = self.notifications.write().await;
        let mut updated = 0;
        for n in notifications
            .values_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;

    fn new(user_id: Uuid, message: &str) -> NewNotification {
        NewNotification::new(user_id, NotificationType::NewBid, message, "/tasks", None)
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_paginated() {
        let repo = InMemoryNotificationRepository::new();
        let user = Uuid::now_v7();
        let other = Uuid::now_v7();

        let batch = (0..5).map(|i| new(user, &format!("n{}", i))).collect();
        repo.insert_many(batch).await.unwrap();
        repo.insert_many(vec![new(other, "not mine")]).await.unwrap();

        let (items, total) = repo
            .list_for_user(user, false, PageParams::new(1, 2))
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|n| n.user_id == user));
    }

    #[tokio::test]
    async fn test_mark_all_read_only_touches_unread() {
        let repo = InMemoryNotificationRepository::new();
        let user = Uuid::now_v7();
        let created = repo
            .insert_many(vec![new(user, "a"), new(user, "b"), new(user, "c")])
            .await
            .unwrap();

        repo.mark_read(created[0].id).await.unwrap();
        assert_eq!(repo.count_unread(user).await.unwrap(), 2);

        assert_eq!(repo.mark_all_read(user).await.unwrap(), 2);
        assert_eq!(repo.count_unread(user).await.unwrap(), 0);

        let (unread, _) = repo
            .list_for_user(user, true, PageParams::default())
            .await
            .unwrap();
        assert!(unread.is_empty());
    }
}
