//! PostgreSQL integration tests for the notifications repository.
//!
//! Requires Docker (testcontainers).

use axum_helpers::PageParams;
use domain_notifications::*;
use test_utils::{TestDataBuilder, TestDatabase};

#[tokio::test]
async fn test_insert_list_and_mark_read() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("notifications_pg_round");
    let user = db.seed_user(builder.user_id(), "FREELANCER").await;

    let service = NotificationService::new(PgNotificationRepository::new(db.connection()));
    let created = service
        .record(vec![
            NewNotification::new(user, NotificationType::BidAccepted, "Accepted", "/tasks/a", None),
            NewNotification::new(user, NotificationType::PaymentReleased, "Paid", "/tasks/a", None),
        ])
        .await
        .unwrap();
    assert_eq!(created.len(), 2);

    let page = service
        .list_notifications(user, false, PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let read = service.mark_read(user, created[0].id).await.unwrap();
    assert!(read.is_read);
    assert_eq!(service.unread_count(user).await.unwrap(), 1);

    assert_eq!(service.mark_all_read(user).await.unwrap(), 1);
    assert_eq!(service.unread_count(user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_mark_read_by_stranger_is_forbidden() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("notifications_pg_forbidden");
    let owner = db.seed_user(builder.id("owner"), "CLIENT").await;
    let stranger = db.seed_user(builder.id("stranger"), "CLIENT").await;

    let service = NotificationService::new(PgNotificationRepository::new(db.connection()));
    let created = service
        .record(vec![NewNotification::new(owner, NotificationType::NewBid, "Bid", "/", None)])
        .await
        .unwrap();

    let err = service.mark_read(stranger, created[0].id).await.unwrap_err();
    assert!(matches!(err, NotificationError::Forbidden(_)));
}
