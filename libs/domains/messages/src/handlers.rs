use axum::{Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{
    ApiResponse, PageParams, Paginated, UuidPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use domain_notifications::EffectHandler;
use domain_users::Actor;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::MessageResult;
use crate::models::{CreateMessage, Message};
use crate::repository::MessageRepository;
use crate::service::MessageService;

const TAG: &str = "messages";

#[derive(OpenApi)]
#[openapi(
    paths(list_messages, create_message),
    components(schemas(Message, CreateMessage)),
    tags((name = TAG, description = "Conversation between a task's client and freelancer"))
)]
pub struct ApiDoc;

struct MessagesState<R: MessageRepository> {
    service: MessageService<R>,
    effects: Arc<dyn EffectHandler>,
}

/// Mounted under `/messages`
pub fn router<R: MessageRepository + 'static>(
    service: MessageService<R>,
    effects: Arc<dyn EffectHandler>,
) -> Router {
    let state = Arc::new(MessagesState { service, effects });

    Router::new()
        .route("/tasks/{id}", get(list_messages).post(create_message))
        .with_state(state)
}

/// Conversation history of a task, oldest first
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Task ID"), PageParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of messages", body = ApiResponse<Paginated<Message>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn list_messages<R: MessageRepository>(
    State(state): State<Arc<MessagesState<R>>>,
    actor: Actor,
    UuidPath(task_id): UuidPath,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> MessageResult<ApiResponse<Paginated<Message>>> {
    let messages = state.service.list_messages(&actor, task_id, page).await?;
    Ok(ApiResponse::ok(messages))
}

/// Send a message to the other party of a task
#[utoipa::path(
    post,
    path = "/tasks/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = CreateMessage,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<Message>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn create_message<R: MessageRepository>(
    State(state): State<Arc<MessagesState<R>>>,
    actor: Actor,
    UuidPath(task_id): UuidPath,
    ValidatedJson(input): ValidatedJson<CreateMessage>,
) -> MessageResult<(StatusCode, ApiResponse<Message>)> {
    let message = state
        .service
        .create_message(&actor, task_id, &input.content)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok((StatusCode::CREATED, ApiResponse::ok(message)))
}
