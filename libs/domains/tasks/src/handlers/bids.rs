use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use axum_helpers::{
    ApiResponse, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use domain_users::Actor;
use std::sync::Arc;
use uuid::Uuid;

use super::{BIDS_TAG, TasksState, audit};
use crate::error::TaskResult;
use crate::models::{AcceptBidResponse, Bid, CreateBid};
use crate::repository::TaskRepository;

/// Bid on an open task (FREELANCER only)
#[utoipa::path(
    post,
    path = "/tasks/{id}/bids",
    tag = BIDS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = CreateBid,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Bid placed", body = ApiResponse<Bid>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn create_bid<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(task_id): UuidPath,
    ValidatedJson(input): ValidatedJson<CreateBid>,
) -> TaskResult<(StatusCode, ApiResponse<Bid>)> {
    let bid = state
        .bids
        .create_bid(&actor, task_id, input)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok((StatusCode::CREATED, ApiResponse::with_message("Bid placed", bid)))
}

/// Bids on a task; freelancers only see their own
#[utoipa::path(
    get,
    path = "/tasks/{id}/bids",
    tag = BIDS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bids, oldest first", body = ApiResponse<Vec<Bid>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn list_bids<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(task_id): UuidPath,
) -> TaskResult<ApiResponse<Vec<Bid>>> {
    let bids = state.bids.list_bids(&actor, task_id).await?;
    Ok(ApiResponse::ok(bids))
}

/// The caller's bids across all tasks
#[utoipa::path(
    get,
    path = "/bids/mine",
    tag = BIDS_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bids, newest first", body = ApiResponse<Vec<Bid>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
pub async fn list_my_bids<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
) -> TaskResult<ApiResponse<Vec<Bid>>> {
    let bids = state.bids.list_my_bids(&actor).await?;
    Ok(ApiResponse::ok(bids))
}

/// Withdraw a pending bid
#[utoipa::path(
    delete,
    path = "/bids/{id}",
    tag = BIDS_TAG,
    params(("id" = Uuid, Path, description = "Bid ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Bid withdrawn"),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn withdraw_bid<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(id): UuidPath,
) -> TaskResult<StatusCode> {
    state.bids.withdraw_bid(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accept a bid, assigning its freelancer and rejecting every other bid
#[utoipa::path(
    post,
    path = "/bids/{id}/accept",
    tag = BIDS_TAG,
    params(("id" = Uuid, Path, description = "Bid ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bid accepted", body = ApiResponse<AcceptBidResponse>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn accept_bid<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> TaskResult<ApiResponse<AcceptBidResponse>> {
    let result = state.bids.accept_bid(&actor, id).await;
    audit(Some(&actor), "bid.accept", ("bid", id), &result, &headers);

    let accepted = result?.deliver(state.effects.as_ref()).await;
    Ok(ApiResponse::with_message(
        "Bid accepted",
        AcceptBidResponse::from(accepted),
    ))
}
