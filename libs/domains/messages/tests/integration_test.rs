//! PostgreSQL integration tests for the messages repository.
//!
//! Requires Docker (testcontainers).

use axum_helpers::PageParams;
use domain_messages::*;
use domain_users::{Actor, Role};
use test_utils::assertions::{assert_err_contains, assert_uuid_eq};
use test_utils::{TestDataBuilder, TestDatabase};
use uuid::Uuid;

#[tokio::test]
async fn test_thread_reads_task_participants() {
    let db = TestDatabase::new().await;
    let client = db.seed_user(Uuid::now_v7(), "CLIENT").await;
    let freelancer = db.seed_user(Uuid::now_v7(), "FREELANCER").await;
    let category = db.seed_category(Uuid::now_v7(), "Design").await;
    let task = db
        .seed_task(Uuid::now_v7(), client, category, "IN_PROGRESS", Some(freelancer))
        .await;

    let repository = PgMessageRepository::new(db.connection());
    let thread = repository.thread(task).await.unwrap().unwrap();
    assert_eq!(thread.client_id, client);
    assert_eq!(thread.freelancer_id, Some(freelancer));
    assert!(repository.thread(Uuid::now_v7()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_conversation_round_trip() {
    let db = TestDatabase::new().await;
    let client = db.seed_user(Uuid::now_v7(), "CLIENT").await;
    let freelancer = db.seed_user(Uuid::now_v7(), "FREELANCER").await;
    let category = db.seed_category(Uuid::now_v7(), "Writing").await;
    let task = db
        .seed_task(Uuid::now_v7(), client, category, "IN_PROGRESS", Some(freelancer))
        .await;

    let service = MessageService::new(PgMessageRepository::new(db.connection()));
    let client = Actor::new(client, Role::Client);
    let freelancer = Actor::new(freelancer, Role::Freelancer);

    service.create_message(&client, task, "Outline attached").await.unwrap();
    service.create_message(&freelancer, task, "Looks good").await.unwrap();
    service.create_message(&client, task, "Thanks").await.unwrap();

    let page = service
        .list_messages(&freelancer, task, PageParams::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let contents: Vec<_> = page.items.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["Outline attached", "Looks good"]);
}

#[tokio::test]
async fn test_outsiders_and_unknown_tasks_are_refused() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("messages_pg_outsider");
    let client = db.seed_user(builder.id("client"), "CLIENT").await;
    let freelancer = db.seed_user(builder.id("freelancer"), "FREELANCER").await;
    let outsider = db.seed_user(builder.id("outsider"), "FREELANCER").await;
    let category = db
        .seed_category(builder.id("category"), &builder.name("category", "video"))
        .await;
    let task = db
        .seed_task(builder.id("task"), client, category, "IN_PROGRESS", Some(freelancer))
        .await;

    let repository = PgMessageRepository::new(db.connection());
    let stored = repository
        .create(Message::new(task, freelancer, "First cut uploaded"))
        .await
        .unwrap();
    assert_uuid_eq(stored.task_id, task, "stored message task");

    assert_err_contains(
        repository
            .create(Message::new(builder.id("missing"), client, "Hello?"))
            .await,
        "Task not found",
    );

    let service = MessageService::new(repository);
    let outsider = Actor::new(outsider, Role::Freelancer);
    assert_err_contains(
        service.list_messages(&outsider, task, PageParams::default()).await,
        "Forbidden",
    );
}
