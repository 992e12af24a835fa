//! HTTP endpoints for tasks, bids, milestones and the payment webhook.
//!
//! Everything is served by one [`router`] with absolute paths so it can be
//! merged straight into the `/api` router.

mod bids;
mod milestones;
mod tasks;

use axum::{
    Router,
    routing::{delete, get, post},
};
use axum_helpers::{AuditEvent, AuditOutcome, Empty};
use domain_notifications::EffectHandler;
use domain_users::Actor;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::models::{
    AcceptBidResponse, Bid, BidStatus, CreateBid, CreateMilestones, CreateTask, FundingIntent,
    Milestone, MilestoneStatus, NewMilestone, PaymentWebhook, RevisionRequest, Task, TaskStatus,
    Transaction, TransactionStatus, TransactionType, UpdateTask,
};
use crate::payment::WebhookVerifier;
use crate::repository::TaskRepository;
use crate::service::{BidService, MilestoneService, TaskService};

pub const TASKS_TAG: &str = "tasks";
pub const BIDS_TAG: &str = "bids";
pub const MILESTONES_TAG: &str = "milestones";
pub const PAYMENTS_TAG: &str = "payments";

#[derive(OpenApi)]
#[openapi(
    paths(
        tasks::list_tasks,
        tasks::create_task,
        tasks::get_task,
        tasks::update_task,
        tasks::delete_task,
        tasks::cancel_task,
        tasks::submit_task,
        tasks::complete_task,
        bids::create_bid,
        bids::list_bids,
        bids::list_my_bids,
        bids::withdraw_bid,
        bids::accept_bid,
        milestones::create_milestones,
        milestones::list_milestones,
        milestones::submit_milestone,
        milestones::request_revision,
        milestones::approve_milestone,
        milestones::fund_milestone,
        milestones::list_transactions,
        milestones::payment_webhook,
    ),
    components(schemas(
        Task,
        TaskStatus,
        CreateTask,
        UpdateTask,
        Bid,
        BidStatus,
        CreateBid,
        AcceptBidResponse,
        Milestone,
        MilestoneStatus,
        NewMilestone,
        CreateMilestones,
        RevisionRequest,
        Transaction,
        TransactionType,
        TransactionStatus,
        FundingIntent,
        PaymentWebhook,
        Empty
    )),
    tags(
        (name = TASKS_TAG, description = "Posting and running tasks"),
        (name = BIDS_TAG, description = "Bidding on open tasks"),
        (name = MILESTONES_TAG, description = "Milestones, escrow funding and the ledger"),
        (name = PAYMENTS_TAG, description = "Payment provider callbacks")
    )
)]
pub struct ApiDoc;

/// Services and the effect sink shared by every tasks endpoint
pub struct TasksState<R: TaskRepository> {
    pub tasks: TaskService<R>,
    pub bids: BidService<R>,
    pub milestones: MilestoneService<R>,
    pub effects: Arc<dyn EffectHandler>,
    /// Refuses every payment callback until a secret is configured
    pub webhook: WebhookVerifier,
}

impl<R: TaskRepository> TasksState<R> {
    pub fn new(
        tasks: TaskService<R>,
        bids: BidService<R>,
        milestones: MilestoneService<R>,
        effects: Arc<dyn EffectHandler>,
    ) -> Self {
        Self {
            tasks,
            bids,
            milestones,
            effects,
            webhook: WebhookVerifier::disabled(),
        }
    }

    pub fn with_webhook_verifier(mut self, webhook: WebhookVerifier) -> Self {
        self.webhook = webhook;
        self
    }
}

pub fn router<R: TaskRepository + 'static>(state: TasksState<R>) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{id}/cancel", post(tasks::cancel_task))
        .route("/tasks/{id}/submit", post(tasks::submit_task))
        .route("/tasks/{id}/complete", post(tasks::complete_task))
        .route(
            "/tasks/{id}/bids",
            get(bids::list_bids).post(bids::create_bid),
        )
        .route("/bids/mine", get(bids::list_my_bids))
        .route("/bids/{id}", delete(bids::withdraw_bid))
        .route("/bids/{id}/accept", post(bids::accept_bid))
        .route(
            "/tasks/{id}/milestones",
            get(milestones::list_milestones).post(milestones::create_milestones),
        )
        .route("/milestones/{id}/submit", post(milestones::submit_milestone))
        .route(
            "/milestones/{id}/request-revision",
            post(milestones::request_revision),
        )
        .route("/milestones/{id}/approve", post(milestones::approve_milestone))
        .route("/milestones/{id}/fund", post(milestones::fund_milestone))
        .route("/tasks/{id}/transactions", get(milestones::list_transactions))
        .route("/payments/webhook", post(milestones::payment_webhook))
        .with_state(state)
}

/// Audit a write, classifying authorization failures as denials.
pub(crate) fn audit<T>(
    actor: Option<&Actor>,
    action: &str,
    target: (&'static str, Uuid),
    result: &TaskResult<T>,
    headers: &axum::http::HeaderMap,
) {
    let outcome = match result {
        Ok(_) => AuditOutcome::Success,
        Err(TaskError::Forbidden(_) | TaskError::Unauthorized(_)) => AuditOutcome::Denied,
        Err(_) => AuditOutcome::Failure,
    };
    AuditEvent::new(actor.map(|a| a.id.to_string()), action, None, outcome)
        .on(target.0, target.1)
        .from_headers(headers)
        .log();
}
