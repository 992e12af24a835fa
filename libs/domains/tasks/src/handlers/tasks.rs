use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use axum_helpers::{
    ApiResponse, PageParams, Paginated, UuidPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        ForbiddenResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_users::Actor;
use std::sync::Arc;
use uuid::Uuid;

use super::{TASKS_TAG, TasksState, audit};
use crate::error::TaskResult;
use crate::models::{CreateTask, ListTasksParams, Task, UpdateTask};
use crate::repository::TaskRepository;

/// Browse tasks, newest first
#[utoipa::path(
    get,
    path = "/tasks",
    tag = TASKS_TAG,
    params(ListTasksParams, PageParams),
    responses(
        (status = 200, description = "Page of tasks", body = ApiResponse<Paginated<Task>>),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
pub async fn list_tasks<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    ValidatedQuery(params): ValidatedQuery<ListTasksParams>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> TaskResult<ApiResponse<Paginated<Task>>> {
    let tasks = state.tasks.list_tasks(params.into(), page).await?;
    Ok(ApiResponse::ok(tasks))
}

/// Post a new task (CLIENT only)
#[utoipa::path(
    post,
    path = "/tasks",
    tag = TASKS_TAG,
    request_body = CreateTask,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Task created", body = ApiResponse<Task>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn create_task<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateTask>,
) -> TaskResult<(StatusCode, ApiResponse<Task>)> {
    let result = state.tasks.create_task(&actor, input).await;
    let target = result.as_ref().map_or(Uuid::nil(), |t| t.id);
    audit(Some(&actor), "task.create", ("task", target), &result, &headers);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Task created", result?),
    ))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = TASKS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = ApiResponse<Task>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
pub async fn get_task<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    UuidPath(id): UuidPath,
) -> TaskResult<ApiResponse<Task>> {
    let task = state.tasks.get_task(id).await?;
    Ok(ApiResponse::ok(task))
}

/// Edit an open task (owner only)
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = TASKS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTask,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task updated", body = ApiResponse<Task>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn update_task<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(changes): ValidatedJson<UpdateTask>,
) -> TaskResult<ApiResponse<Task>> {
    let result = state.tasks.update_task(&actor, id, changes).await;
    audit(Some(&actor), "task.update", ("task", id), &result, &headers);

    Ok(ApiResponse::with_message("Task updated", result?))
}

/// Delete an open task together with its bids (owner only)
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = TASKS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn delete_task<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> TaskResult<StatusCode> {
    let result = state.tasks.delete_task(&actor, id).await;
    audit(Some(&actor), "task.delete", ("task", id), &result, &headers);

    result?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel an open or in-progress task (owner only)
#[utoipa::path(
    post,
    path = "/tasks/{id}/cancel",
    tag = TASKS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task cancelled", body = ApiResponse<Task>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn cancel_task<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> TaskResult<ApiResponse<Task>> {
    let result = state.tasks.cancel_task(&actor, id).await;
    audit(Some(&actor), "task.cancel", ("task", id), &result, &headers);

    let task = result?.deliver(state.effects.as_ref()).await;
    Ok(ApiResponse::with_message("Task cancelled", task))
}

/// Hand the work over for review (assigned freelancer only)
#[utoipa::path(
    post,
    path = "/tasks/{id}/submit",
    tag = TASKS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task in review", body = ApiResponse<Task>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn submit_task<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    UuidPath(id): UuidPath,
) -> TaskResult<ApiResponse<Task>> {
    let task = state
        .tasks
        .submit_for_review(&actor, id)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok(ApiResponse::with_message("Task submitted for review", task))
}

/// Close a reviewed task once every milestone is approved (owner only)
#[utoipa::path(
    post,
    path = "/tasks/{id}/complete",
    tag = TASKS_TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task completed", body = ApiResponse<Task>),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
pub async fn complete_task<R: TaskRepository>(
    State(state): State<Arc<TasksState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> TaskResult<ApiResponse<Task>> {
    let result = state.tasks.complete_task(&actor, id).await;
    audit(Some(&actor), "task.complete", ("task", id), &result, &headers);

    let task = result?.deliver(state.effects.as_ref()).await;
    Ok(ApiResponse::with_message("Task completed", task))
}
