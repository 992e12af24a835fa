//! Handler tests for the tasks domain
//!
//! The whole task router runs against the in-memory repository; effects are
//! captured by a recording handler instead of being delivered.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_helpers::JwtClaims;
use domain_notifications::{Effect, EffectHandler, NotificationType, RecordingEffectHandler};
use domain_tasks::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const WEBHOOK_SECRET: &str = "whsec_handler_tests";

struct TestApp {
    router: Router,
    effects: Arc<RecordingEffectHandler>,
    signer: WebhookVerifier,
    category: Uuid,
    client: User,
}

#[derive(Clone, Copy)]
struct User {
    id: Uuid,
    role: &'static str,
}

impl User {
    fn new(role: &'static str) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
        }
    }
}

async fn app() -> TestApp {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let category = Uuid::now_v7();
    repository.add_category(category).await;

    let effects = Arc::new(RecordingEffectHandler::new());
    let dyn_effects: Arc<dyn EffectHandler> = effects.clone();
    let state = TasksState::new(
        TaskService::from_shared(repository.clone()),
        BidService::from_shared(repository.clone()),
        MilestoneService::from_shared(repository, Arc::new(InProcessGateway::new())),
        dyn_effects,
    )
    .with_webhook_verifier(WebhookVerifier::new(WEBHOOK_SECRET));

    TestApp {
        router: router(state),
        effects,
        signer: WebhookVerifier::new(WEBHOOK_SECRET),
        category,
        client: User::new("CLIENT"),
    }
}

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, body: Option<Value>, user: Option<User>) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    if let Some(user) = user {
        request.extensions_mut().insert(JwtClaims::new(
            user.id,
            "someone@example.com",
            user.role,
            3600,
        ));
    }
    request
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        user: Option<User>,
    ) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request(method, uri, body, user))
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    /// Posts a provider callback, signed with `signer` when given.
    async fn webhook(&self, payload: &Value, signer: Option<&WebhookVerifier>) -> StatusCode {
        let body = payload.to_string();
        let mut builder = Request::builder()
            .method("POST")
            .uri("/payments/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signer) = signer {
            builder = builder.header(SIGNATURE_HEADER, signer.sign(body.as_bytes()).unwrap());
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        response.status()
    }

    async fn create_task(&self, budget: i64) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/tasks",
                Some(json!({
                    "title": "Landing page",
                    "description": "One page with a signup form",
                    "budget": budget,
                    "category_id": self.category,
                })),
                Some(self.client),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn bid(&self, task_id: &str, freelancer: User, amount: i64) -> String {
        let (status, body) = self
            .send(
                "POST",
                &format!("/tasks/{}/bids", task_id),
                Some(json!({ "amount": amount, "proposal": "I can do this" })),
                Some(freelancer),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    fn notification_types(&self) -> Vec<(Uuid, NotificationType)> {
        self.effects
            .take()
            .into_iter()
            .filter_map(|e| match e {
                Effect::Notify(n) => Some((n.user_id, n.notification_type)),
                _ => None,
            })
            .collect()
    }
}

#[tokio::test]
async fn test_accept_bid_scenario() {
    let app = app().await;
    let alice = User::new("FREELANCER");
    let bob = User::new("FREELANCER");

    let task_id = app.create_task(500).await;
    let alice_bid = app.bid(&task_id, alice, 450).await;
    app.bid(&task_id, bob, 400).await;
    app.effects.take();

    let (status, body) = app
        .send(
            "POST",
            &format!("/bids/{}/accept", alice_bid),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["task"]["status"], "IN_PROGRESS");
    assert_eq!(body["data"]["task"]["freelancer_id"], alice.id.to_string());
    assert_eq!(body["data"]["bid"]["status"], "ACCEPTED");
    assert_eq!(body["data"]["rejected_bids"], 1);

    let notes = app.notification_types();
    assert!(notes.contains(&(alice.id, NotificationType::BidAccepted)));
    assert!(notes.contains(&(bob.id, NotificationType::BidRejected)));

    let (_, body) = app
        .send(
            "GET",
            &format!("/tasks/{}/bids", task_id),
            None,
            Some(app.client),
        )
        .await;
    let statuses: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, ["ACCEPTED", "REJECTED"]);
}

#[tokio::test]
async fn test_task_reads_are_public_and_filterable() {
    let app = app().await;
    let first = app.create_task(100).await;
    app.create_task(900).await;

    let (status, body) = app
        .send("GET", "/tasks?min_budget=500&limit=10", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["budget"], 900);

    let (status, body) = app.send("GET", &format!("/tasks/{}", first), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "OPEN");

    let (status, _) = app
        .send("GET", &format!("/tasks/{}", Uuid::now_v7()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", "/tasks?limit=500", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_posting_requires_a_client() {
    let app = app().await;
    let task = json!({
        "title": "Logo",
        "description": "Vector logo",
        "budget": 100,
        "category_id": app.category,
    });

    let (status, _) = app.send("POST", "/tasks", Some(task.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send("POST", "/tasks", Some(task), Some(User::new("FREELANCER")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            "POST",
            "/tasks",
            Some(json!({
                "title": "",
                "description": "Vector logo",
                "budget": 100,
                "category_id": app.category,
            })),
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app
        .send(
            "POST",
            "/tasks",
            Some(json!({
                "title": "Logo",
                "description": "Vector logo",
                "budget": 100,
                "category_id": Uuid::now_v7(),
            })),
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_bid_conflicts() {
    let app = app().await;
    let freelancer = User::new("FREELANCER");
    let task_id = app.create_task(300).await;
    app.bid(&task_id, freelancer, 250).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/tasks/{}/bids", task_id),
            Some(json!({ "amount": 200, "proposal": "Cheaper now" })),
            Some(freelancer),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("pending bid"));

    let (status, body) = app.send("GET", "/bids/mine", None, Some(freelancer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_milestone_revision_and_approval_over_http() {
    let app = app().await;
    let freelancer = User::new("FREELANCER");
    let task_id = app.create_task(500).await;
    let bid_id = app.bid(&task_id, freelancer, 500).await;
    app.send(
        "POST",
        &format!("/bids/{}/accept", bid_id),
        None,
        Some(app.client),
    )
    .await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/tasks/{}/milestones", task_id),
            Some(json!({
                "milestones": [{ "description": "Wireframes", "amount": 200 }]
            })),
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let milestone_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            "POST",
            &format!("/milestones/{}/approve", milestone_id),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            "POST",
            &format!("/milestones/{}/submit", milestone_id),
            None,
            Some(freelancer),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            "POST",
            &format!("/milestones/{}/request-revision", milestone_id),
            Some(json!({ "comments": "add tests" })),
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "REVISION_REQUESTED");
    assert_eq!(body["data"]["revision_comments"], "add tests");

    app.send(
        "POST",
        &format!("/milestones/{}/submit", milestone_id),
        None,
        Some(freelancer),
    )
    .await;
    let (status, body) = app
        .send(
            "POST",
            &format!("/milestones/{}/approve", milestone_id),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "APPROVED");

    let (status, body) = app
        .send(
            "GET",
            &format!("/tasks/{}/transactions", task_id),
            None,
            Some(freelancer),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| (t["type"].as_str().unwrap().to_string(), t["amount"].as_i64().unwrap()))
        .collect();
    assert!(kinds.contains(&("ESCROW_RELEASE".to_string(), 200)));
    assert!(kinds.contains(&("PLATFORM_FEE".to_string(), 20)));

    let (status, _) = app
        .send(
            "GET",
            &format!("/tasks/{}/transactions", task_id),
            None,
            Some(User::new("CLIENT")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_funding_settles_through_webhook() {
    let app = app().await;
    let freelancer = User::new("FREELANCER");
    let task_id = app.create_task(500).await;
    let bid_id = app.bid(&task_id, freelancer, 500).await;
    app.send(
        "POST",
        &format!("/bids/{}/accept", bid_id),
        None,
        Some(app.client),
    )
    .await;
    let (_, body) = app
        .send(
            "POST",
            &format!("/tasks/{}/milestones", task_id),
            Some(json!({ "milestones": [{ "description": "All of it", "amount": 500 }] })),
            Some(app.client),
        )
        .await;
    let milestone_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "POST",
            &format!("/milestones/{}/fund", milestone_id),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body["data"]["client_secret"].as_str().unwrap().contains("_secret_"));
    let reference = body["data"]["transaction"]["provider_reference"]
        .as_str()
        .unwrap()
        .to_string();
    app.effects.take();

    let webhook = json!({ "provider_reference": reference, "succeeded": true });

    // Unsigned and wrongly signed callbacks never reach the ledger
    assert_eq!(app.webhook(&webhook, None).await, StatusCode::UNAUTHORIZED);
    let forged = WebhookVerifier::new("someone-else");
    assert_eq!(
        app.webhook(&webhook, Some(&forged)).await,
        StatusCode::UNAUTHORIZED
    );
    assert!(app.notification_types().is_empty());

    let (status, body) = app
        .send(
            "GET",
            &format!("/tasks/{}/transactions", task_id),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["status"], "PENDING");

    assert_eq!(
        app.webhook(&webhook, Some(&app.signer)).await,
        StatusCode::OK
    );
    assert_eq!(
        app.notification_types(),
        [(app.client.id, NotificationType::PaymentConfirmed)]
    );

    assert_eq!(
        app.webhook(&webhook, Some(&app.signer)).await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn test_webhook_refused_without_secret() {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let effects: Arc<dyn EffectHandler> = Arc::new(RecordingEffectHandler::new());
    let state = TasksState::new(
        TaskService::from_shared(repository.clone()),
        BidService::from_shared(repository.clone()),
        MilestoneService::from_shared(repository, Arc::new(InProcessGateway::new())),
        effects,
    );

    let response = router(state)
        .oneshot(request(
            "POST",
            "/payments/webhook",
            Some(json!({ "provider_reference": "pi_1", "succeeded": true })),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signed_webhook_still_validates_body() {
    let app = app().await;
    let status = app
        .webhook(
            &json!({ "provider_reference": "", "succeeded": true }),
            Some(&app.signer),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let status = app
        .webhook(
            &json!({ "provider_reference": "pi_unknown", "succeeded": true }),
            Some(&app.signer),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_and_complete_rules() {
    let app = app().await;
    let freelancer = User::new("FREELANCER");
    let task_id = app.create_task(500).await;
    let bid_id = app.bid(&task_id, freelancer, 500).await;
    app.send(
        "POST",
        &format!("/bids/{}/accept", bid_id),
        None,
        Some(app.client),
    )
    .await;

    let (status, _) = app
        .send(
            "POST",
            &format!("/tasks/{}/complete", task_id),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            "POST",
            &format!("/tasks/{}/submit", task_id),
            None,
            Some(freelancer),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "IN_REVIEW");

    let (status, body) = app
        .send(
            "POST",
            &format!("/tasks/{}/complete", task_id),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");

    let (status, _) = app
        .send(
            "POST",
            &format!("/tasks/{}/cancel", task_id),
            None,
            Some(app.client),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_open_task() {
    let app = app().await;
    let task_id = app.create_task(100).await;

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/tasks/{}", task_id),
            None,
            Some(User::new("CLIENT")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send("DELETE", &format!("/tasks/{}", task_id), None, Some(app.client))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let response = app
        .router
        .clone()
        .oneshot(request("GET", &format!("/tasks/{}", task_id), None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("not found"));
}
