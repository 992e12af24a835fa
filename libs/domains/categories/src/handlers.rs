use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
};
use axum_helpers::{
    ApiResponse, AuditEvent, AuditOutcome, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_users::Actor;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{CategoryError, CategoryResult};
use crate::models::{Category, CreateCategory, UpdateCategory};
use crate::repository::CategoryRepository;
use crate::service::CategoryService;

const TAG: &str = "categories";

#[derive(OpenApi)]
#[openapi(
    paths(
        list_categories,
        create_category,
        get_category,
        update_category,
        delete_category,
    ),
    components(schemas(Category, CreateCategory, UpdateCategory)),
    tags((name = TAG, description = "Task categories"))
)]
pub struct ApiDoc;

pub fn router<R: CategoryRepository + 'static>(service: CategoryService<R>) -> Router {
    let state = Arc::new(service);

    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .with_state(state)
}

fn audit<T>(
    actor: &Actor,
    action: &str,
    target: Option<Uuid>,
    result: &CategoryResult<T>,
    headers: &HeaderMap,
) {
    let outcome = match result {
        Ok(_) => AuditOutcome::Success,
        Err(CategoryError::Forbidden(_)) => AuditOutcome::Denied,
        Err(_) => AuditOutcome::Failure,
    };
    let mut event = AuditEvent::new(Some(actor.id.to_string()), action, None, outcome)
        .from_headers(headers);
    if let Some(id) = target {
        event = event.on("category", id);
    }
    event.log();
}

/// List all categories
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    responses(
        (status = 200, description = "Categories ordered by name", body = ApiResponse<Vec<Category>>)
    )
)]
async fn list_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> CategoryResult<ApiResponse<Vec<Category>>> {
    let categories = service.list_categories().await?;
    Ok(ApiResponse::ok(categories))
}

/// Create a category
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateCategory,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn create_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    actor: Actor,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> CategoryResult<(StatusCode, ApiResponse<Category>)> {
    let result = service.create_category(&actor, input).await;
    let target = result.as_ref().ok().map(|c| c.id);
    audit(&actor, "category.create", target, &result, &headers);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Category created", result?),
    ))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<Category>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
) -> CategoryResult<ApiResponse<Category>> {
    let category = service.get_category(id).await?;
    Ok(ApiResponse::ok(category))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategory,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<Category>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> CategoryResult<ApiResponse<Category>> {
    let result = service.update_category(&actor, id, input).await;
    audit(&actor, "category.update", Some(id), &result, &headers);

    Ok(ApiResponse::with_message("Category updated", result?))
}

/// Delete a category that no task references
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, response = BadRequestResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn delete_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    actor: Actor,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> CategoryResult<StatusCode> {
    let result = service.delete_category(&actor, id).await;
    audit(&actor, "category.delete", Some(id), &result, &headers);

    result?;
    Ok(StatusCode::NO_CONTENT)
}
