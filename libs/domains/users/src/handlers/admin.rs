use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch},
};
use axum_helpers::{
    ApiResponse, AuditEvent, AuditOutcome, PageParams, Paginated, UuidPath, ValidatedJson,
    ValidatedQuery,
    errors::responses::{
        BadRequestUuidResponse, ForbiddenResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_notifications::EffectHandler;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use super::ADMIN_TAG;
use crate::actor::Actor;
use crate::admin::AdminService;
use crate::error::{UserError, UserResult};
use crate::models::{ListUsersParams, Role, UpdateUserStatus, UserResponse};
use crate::repository::UserRepository;

#[derive(OpenApi)]
#[openapi(
    paths(list_users, update_user_status, delete_user),
    components(schemas(UserResponse, UpdateUserStatus, Role))
)]
pub struct ApiDoc;

struct AdminState<R: UserRepository> {
    service: AdminService<R>,
    effects: Arc<dyn EffectHandler>,
}

pub fn router<R: UserRepository + 'static>(
    service: AdminService<R>,
    effects: Arc<dyn EffectHandler>,
) -> Router {
    let state = Arc::new(AdminState { service, effects });

    Router::new()
        .route("/", get(list_users))
        .route("/{id}", delete(delete_user))
        .route("/{id}/status", patch(update_user_status))
        .with_state(state)
}

fn audit<T>(
    actor: &Actor,
    action: &str,
    target: Uuid,
    result: &UserResult<T>,
    headers: &HeaderMap,
) {
    let outcome = match result {
        Ok(_) => AuditOutcome::Success,
        Err(UserError::Forbidden(_)) => AuditOutcome::Denied,
        Err(_) => AuditOutcome::Failure,
    };
    AuditEvent::new(Some(actor.id.to_string()), action, None, outcome)
        .on("user", target)
        .from_headers(headers)
        .log();
}

/// List accounts with optional filters
#[utoipa::path(
    get,
    path = "",
    tag = ADMIN_TAG,
    params(ListUsersParams, PageParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of users", body = ApiResponse<Paginated<UserResponse>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(state): State<Arc<AdminState<R>>>,
    actor: Actor,
    ValidatedQuery(params): ValidatedQuery<ListUsersParams>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> UserResult<ApiResponse<Paginated<UserResponse>>> {
    let users = state.service.list_users(&actor, params.into(), page).await?;
    Ok(ApiResponse::ok(users))
}

/// Suspend, reinstate or change the role of an account
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = ADMIN_TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserStatus,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserResponse>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_user_status<R: UserRepository>(
    State(state): State<Arc<AdminState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(change): ValidatedJson<UpdateUserStatus>,
) -> UserResult<ApiResponse<UserResponse>> {
    let result = state.service.update_user_status(&actor, id, change).await;
    audit(&actor, "admin.user_status", id, &result, &headers);

    let user = result?.deliver(state.effects.as_ref()).await;
    Ok(ApiResponse::with_message("User updated", user))
}

/// Delete an account and everything it owns
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = ADMIN_TAG,
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(state): State<Arc<AdminState<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> UserResult<StatusCode> {
    let result = state.service.delete_user(&actor, id).await;
    audit(&actor, "admin.user_delete", id, &result, &headers);

    result?;
    Ok(StatusCode::NO_CONTENT)
}
