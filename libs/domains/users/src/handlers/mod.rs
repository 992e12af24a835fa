//! HTTP endpoints for identity, profiles and account administration.
//!
//! - [`auth::router`] mounts under `/auth`
//! - [`profile::router`] mounts under `/users`
//! - [`admin::router`] mounts under `/admin/users`

pub mod admin;
pub mod auth;
pub mod profile;

use utoipa::OpenApi;

pub use admin::router as admin_router;
pub use auth::{AuthState, router as auth_router};
pub use profile::router as profile_router;

pub const AUTH_TAG: &str = "auth";
pub const USERS_TAG: &str = "users";
pub const ADMIN_TAG: &str = "admin";

/// OpenAPI documentation for everything this crate serves
#[derive(OpenApi)]
#[openapi(
    nest(
        (path = "/auth", api = auth::ApiDoc),
        (path = "/users", api = profile::ApiDoc),
        (path = "/admin/users", api = admin::ApiDoc)
    ),
    tags(
        (name = AUTH_TAG, description = "Registration, email verification, login and password recovery"),
        (name = USERS_TAG, description = "The signed-in user's account and profile"),
        (name = ADMIN_TAG, description = "Account administration (ADMIN only)")
    )
)]
pub struct ApiDoc;
