use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use axum_helpers::{
    ApiResponse, AppError, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse, NotFoundResponse,
        ServiceUnavailableResponse, UnauthorizedResponse,
    },
};
use domain_users::Actor;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{MILESTONES_TAG, PAYMENTS_TAG, TasksState, audit};
use crate::error::TaskResult;
use crate::models::{
    CreateMilestones, FundingIntent, Milestone, PaymentWebhook, RevisionRequest, Transaction,
};
use crate::payment::SIGNATURE_HEADER;
use crate::repository::TaskRepository;

/// Split an in-progress task into milestones (owner only)
#[utoipa::path(
    post,
    path = "/tasks/{id}/milestones",
    tag = MILESTONES_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = CreateMilestones,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Milestones created", body = ApiResponse<Vec<Milestone>>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn create_milestones<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(task_id): UuidPath,
    ValidatedJson(input): ValidatedJson<CreateMilestones>,
) -> TaskResult<(StatusCode, ApiResponse<Vec<Milestone>>)> {
    let milestones = state
        .milestones
        .create_milestones(&actor, task_id, input)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Milestones created", milestones),
    ))
}

/// Milestones of a task (participants and admins)
#[utoipa::path(
    get,
    path = "/tasks/{id}/milestones",
    tag = MILESTONES_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Milestones in creation order", body = ApiResponse<Vec<Milestone>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn list_milestones<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(task_id): UuidPath,
) -> TaskResult<ApiResponse<Vec<Milestone>>> {
    let milestones = state.milestones.list_milestones(&actor, task_id).await?;
    Ok(ApiResponse::ok(milestones))
}

/// Submit a milestone for approval (assigned freelancer only)
#[utoipa::path(
    post,
    path = "/milestones/{id}/submit",
    tag = MILESTONES_TAG,
    params(("id" = Uuid, Path, description = "Milestone ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Milestone submitted", body = ApiResponse<Milestone>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn submit_milestone<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(id): UuidPath,
) -> TaskResult<ApiResponse<Milestone>> {
    let milestone = state
        .milestones
        .submit_milestone(&actor, id)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok(ApiResponse::with_message("Milestone submitted", milestone))
}

/// Send a submitted milestone back with comments (owner only)
#[utoipa::path(
    post,
    path = "/milestones/{id}/request-revision",
    tag = MILESTONES_TAG,
    params(("id" = Uuid, Path, description = "Milestone ID")),
    request_body = RevisionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Revision requested", body = ApiResponse<Milestone>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn request_revision<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<RevisionRequest>,
) -> TaskResult<ApiResponse<Milestone>> {
    let milestone = state
        .milestones
        .request_revision(&actor, id, &input.comments)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok(ApiResponse::with_message("Revision requested", milestone))
}

/// Approve a submitted milestone and release its escrow (owner only)
#[utoipa::path(
    post,
    path = "/milestones/{id}/approve",
    tag = MILESTONES_TAG,
    params(("id" = Uuid, Path, description = "Milestone ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Milestone approved, payment released", body = ApiResponse<Milestone>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn approve_milestone<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> TaskResult<ApiResponse<Milestone>> {
    let result = state.milestones.approve_milestone(&actor, id).await;
    audit(Some(&actor), "milestone.approve", ("milestone", id), &result, &headers);

    let milestone = result?.deliver(state.effects.as_ref()).await;
    Ok(ApiResponse::with_message(
        "Milestone approved and payment released",
        milestone,
    ))
}

/// Start escrow funding for a milestone (owner only)
#[utoipa::path(
    post,
    path = "/milestones/{id}/fund",
    tag = MILESTONES_TAG,
    params(("id" = Uuid, Path, description = "Milestone ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment intent created", body = ApiResponse<FundingIntent>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
pub async fn fund_milestone<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> TaskResult<(StatusCode, ApiResponse<FundingIntent>)> {
    let result = state.milestones.fund_milestone(&actor, id).await;
    audit(Some(&actor), "milestone.fund", ("milestone", id), &result, &headers);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Payment intent created", result?),
    ))
}

/// Ledger entries of a task (participants and admins)
#[utoipa::path(
    get,
    path = "/tasks/{id}/transactions",
    tag = MILESTONES_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Transactions, oldest first", body = ApiResponse<Vec<Transaction>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn list_transactions<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(task_id): UuidPath,
) -> TaskResult<ApiResponse<Vec<Transaction>>> {
    let ledger = state.milestones.transactions_for_task(&actor, task_id).await?;
    Ok(ApiResponse::ok(ledger))
}

/// Payment provider callback settling a funding transaction.
///
/// The raw body must carry a valid `X-Payment-Signature`.
#[utoipa::path(
    post,
    path = "/payments/webhook",
    tag = PAYMENTS_TAG,
    request_body = PaymentWebhook,
    params(
        ("x-payment-signature" = String, Header, description = "Hex HMAC-SHA256 of the raw body")
    ),
    responses(
        (status = 200, description = "Transaction settled", body = ApiResponse<Transaction>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn payment_webhook<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ApiResponse<Transaction>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let verified = state.webhook.verify(&body, signature);
    if verified.is_err() {
        audit(None, "payment.webhook", ("transaction", Uuid::nil()), &verified, &headers);
    }
    verified?;

    let Json(event) = Json::<PaymentWebhook>::from_bytes(&body)?;
    event.validate()?;

    let result = state
        .milestones
        .confirm_payment(&event.provider_reference, event.succeeded)
        .await;
    let target = result.as_ref().map_or(Uuid::nil(), |o| o.value.id);
    audit(None, "payment.webhook", ("transaction", target), &result, &headers);

    let transaction = result?.deliver(state.effects.as_ref()).await;
    Ok(ApiResponse::ok(transaction))
}
