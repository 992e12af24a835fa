use axum::{Router, extract::State, routing::get};
use axum_helpers::{
    ApiResponse, AuthUser, ValidatedJson,
    errors::responses::{BadRequestValidationResponse, NotFoundResponse, UnauthorizedResponse},
};
use std::sync::Arc;
use utoipa::OpenApi;

use super::USERS_TAG;
use crate::error::UserResult;
use crate::models::{Profile, ProfileResponse, UpdateProfile};
use crate::repository::UserRepository;
use crate::service::UserService;

#[derive(OpenApi)]
#[openapi(
    paths(get_me, update_me),
    components(schemas(Profile, ProfileResponse, UpdateProfile))
)]
pub struct ApiDoc;

pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .with_state(shared_service)
}

/// The signed-in user with their profile
#[utoipa::path(
    get,
    path = "/me",
    tag = USERS_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<ProfileResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_me<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    user: AuthUser,
) -> UserResult<ApiResponse<ProfileResponse>> {
    let profile = service.get_profile(user.id).await?;
    Ok(ApiResponse::ok(profile))
}

/// Update the signed-in user's profile
#[utoipa::path(
    patch,
    path = "/me",
    tag = USERS_TAG,
    request_body = UpdateProfile,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileResponse>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn update_me<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    user: AuthUser,
    ValidatedJson(changes): ValidatedJson<UpdateProfile>,
) -> UserResult<ApiResponse<ProfileResponse>> {
    let profile = service.update_profile(user.id, changes).await?;
    Ok(ApiResponse::with_message("Profile updated", profile))
}
