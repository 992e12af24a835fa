use axum::{
    Router,
    extract::{Query, State},
    routing::{get, patch},
};
use axum_helpers::{
    ApiResponse, AuthUser, PageParams, Paginated, UuidPath, ValidatedQuery,
    errors::responses::{
        BadRequestUuidResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::NotificationResult;
use crate::models::{MarkedRead, Notification, NotificationQuery, NotificationType, UnreadCount};
use crate::repository::NotificationRepository;
use crate::service::NotificationService;

pub const TAG: &str = "notifications";

/// OpenAPI documentation for the notifications API
#[derive(OpenApi)]
#[openapi(
    paths(list_notifications, unread_count, mark_read, mark_all_read),
    components(
        schemas(Notification, NotificationType, UnreadCount, MarkedRead),
        responses(
            NotFoundResponse,
            ForbiddenResponse,
            UnauthorizedResponse,
            BadRequestUuidResponse,
            InternalServerErrorResponse
        )
    ),
    tags((name = TAG, description = "In-app notifications for the signed-in user"))
)]
pub struct ApiDoc;

/// Create the notifications router
pub fn router<R: NotificationRepository + 'static>(service: NotificationService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", patch(mark_all_read))
        .route("/{id}/read", patch(mark_read))
        .with_state(shared_service)
}

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(NotificationQuery, PageParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of notifications", body = ApiResponse<Paginated<Notification>>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_notifications<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
    ValidatedQuery(page): ValidatedQuery<PageParams>,
) -> NotificationResult<ApiResponse<Paginated<Notification>>> {
    let notifications = service
        .list_notifications(user.id, query.unread_only, page)
        .await?;
    Ok(ApiResponse::ok(notifications))
}

/// Number of unread notifications
#[utoipa::path(
    get,
    path = "/unread-count",
    tag = TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Unread count", body = ApiResponse<UnreadCount>),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn unread_count<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: AuthUser,
) -> NotificationResult<ApiResponse<UnreadCount>> {
    let count = service.unread_count(user.id).await?;
    Ok(ApiResponse::ok(UnreadCount { count }))
}

/// Mark one notification as read
#[utoipa::path(
    patch,
    path = "/{id}/read",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Notification ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<Notification>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn mark_read<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: AuthUser,
    UuidPath(id): UuidPath,
) -> NotificationResult<ApiResponse<Notification>> {
    let notification = service.mark_read(user.id, id).await?;
    Ok(ApiResponse::ok(notification))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/read-all",
    tag = TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications marked read", body = ApiResponse<MarkedRead>),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn mark_all_read<R: NotificationRepository>(
    State(service): State<Arc<NotificationService<R>>>,
    user: AuthUser,
) -> NotificationResult<ApiResponse<MarkedRead>> {
    let updated = service.mark_all_read(user.id).await?;
    Ok(ApiResponse::with_message(
        "All notifications marked as read",
        MarkedRead { updated },
    ))
}
