//! Handler tests for the notifications domain
//!
//! Exercise the HTTP layer against the in-memory repository: envelope shape,
//! status codes and ownership checks.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_helpers::JwtClaims;
use domain_notifications::*;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, user_id: Option<Uuid>) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    if let Some(id) = user_id {
        request
            .extensions_mut()
            .insert(JwtClaims::new(id, "user@example.com", "CLIENT", 3600));
    }
    request
}

async fn seeded() -> (NotificationService<InMemoryNotificationRepository>, Uuid, Vec<Notification>) {
    let service = NotificationService::new(InMemoryNotificationRepository::new());
    let user = Uuid::now_v7();
    let created = service
        .record(vec![
            NewNotification::new(user, NotificationType::NewBid, "New bid on Logo", "/tasks/1", None),
            NewNotification::new(user, NotificationType::NewMessage, "New message", "/tasks/1/chat", None),
            NewNotification::new(Uuid::now_v7(), NotificationType::NewBid, "someone else", "/", None),
        ])
        .await
        .unwrap();
    (service, user, created)
}

#[tokio::test]
async fn test_list_requires_authentication() {
    let (service, _, _) = seeded().await;
    let app = handlers::router(service);

    let response = app.oneshot(request("GET", "/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_returns_paginated_envelope() {
    let (service, user, _) = seeded().await;
    let app = handlers::router(service);

    let response = app
        .oneshot(request("GET", "/?page=1&limit=1", Some(user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_rejects_oversized_limit() {
    let (service, user, _) = seeded().await;
    let app = handlers::router(service);

    let response = app
        .oneshot(request("GET", "/?limit=500", Some(user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mark_read_of_foreign_notification_is_forbidden() {
    let (service, user, created) = seeded().await;
    let foreign = created[2].id;
    let app = handlers::router(service);

    let response = app
        .oneshot(request("PATCH", &format!("/{}/read", foreign), Some(user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mark_read_then_unread_count_drops() {
    let (service, user, created) = seeded().await;
    let app = handlers::router(service);

    let response = app
        .clone()
        .oneshot(request("PATCH", &format!("/{}/read", created[0].id), Some(user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["data"]["is_read"], true);

    let response = app
        .oneshot(request("GET", "/unread-count", Some(user)))
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn test_mark_all_read() {
    let (service, user, _) = seeded().await;
    let app = handlers::router(service);

    let response = app
        .oneshot(request("PATCH", "/read-all", Some(user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["data"]["updated"], 2);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_uuid_is_bad_request() {
    let (service, user, _) = seeded().await;
    let app = handlers::router(service);

    let response = app
        .oneshot(request("PATCH", "/not-a-uuid/read", Some(user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
