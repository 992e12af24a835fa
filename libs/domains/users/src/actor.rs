//! The authenticated caller as the domain services see it.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_helpers::{AppError, AuthUser, JwtClaims};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Role;
use crate::repository::UserRepository;

/// Identity plus role, passed into every service operation that authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_client(&self) -> bool {
        self.role == Role::Client
    }

    pub fn is_freelancer(&self) -> bool {
        self.role == Role::Freelancer
    }
}

impl TryFrom<&AuthUser> for Actor {
    type Error = AppError;

    fn try_from(user: &AuthUser) -> Result<Self, Self::Error> {
        let role = Role::from_str(&user.role)
            .map_err(|_| AppError::Unauthorized(format!("Unknown role '{}'", user.role)))?;
        Ok(Self::new(user.id, role))
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Actor::try_from(&user)
    }
}

/// Checks the account behind a verified token against the stored user.
///
/// Runs inside the JWT layer. Tokens outlive admin actions, so a deleted
/// account is rejected with 401 and a suspended one with 403. The role in the
/// claims is replaced by the stored role before any extractor reads it.
pub async fn account_status_middleware(
    State(accounts): State<Arc<dyn UserRepository>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(subject) = request
        .extensions()
        .get::<JwtClaims>()
        .map(|claims| claims.sub.clone())
    else {
        return next.run(request).await;
    };
    let Ok(id) = Uuid::parse_str(&subject) else {
        return AppError::Unauthorized("Invalid token subject".to_string()).into_response();
    };

    let user = match accounts.get_by_id(id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(user_id = %id, "Token for a deleted account");
            return AppError::Unauthorized("Account no longer exists".to_string()).into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };
    if user.is_suspended {
        tracing::debug!(user_id = %id, "Token for a suspended account");
        return AppError::Forbidden("Account is suspended".to_string()).into_response();
    }

    if let Some(claims) = request.extensions_mut().get_mut::<JwtClaims>() {
        claims.role = user.role.to_string();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, User};
    use crate::repository::InMemoryUserRepository;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    async fn whoami(actor: Actor) -> String {
        actor.role.to_string()
    }

    fn app(accounts: Arc<InMemoryUserRepository>) -> Router {
        let accounts: Arc<dyn UserRepository> = accounts;
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(accounts, account_status_middleware))
    }

    fn as_user(user: &User, role: &str) -> Request<Body> {
        let mut request = axum::http::Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(JwtClaims::new(user.id, &user.email, role, 3600));
        request
    }

    #[tokio::test]
    async fn test_account_changes_apply_to_live_tokens() {
        let accounts = Arc::new(InMemoryUserRepository::new());
        let user = User::new("c@example.com", "hash".to_string(), Role::Client);
        let user = accounts
            .create(user.clone(), Profile::for_user(user.id, "Casey"))
            .await
            .unwrap();
        let app = app(accounts.clone());

        let response = app.clone().oneshot(as_user(&user, "CLIENT")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Role comes from the stored account, not the token
        let mut promoted = user.clone();
        promoted.role = Role::Admin;
        accounts.update(promoted).await.unwrap();
        let response = app.clone().oneshot(as_user(&user, "CLIENT")).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"ADMIN");

        let mut suspended = user.clone();
        suspended.is_suspended = true;
        accounts.update(suspended).await.unwrap();
        let response = app.clone().oneshot(as_user(&user, "CLIENT")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        accounts.delete(user.id).await.unwrap();
        let response = app.oneshot(as_user(&user, "CLIENT")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_requests_pass_through() {
        let app = app(Arc::new(InMemoryUserRepository::new()));
        let request = axum::http::Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        // The extractor, not the middleware, rejects the missing identity
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extracts_role_from_claims() {
        let id = Uuid::now_v7();
        let mut request = axum::http::Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(JwtClaims::new(id, "f@example.com", "FREELANCER", 60));
        let (mut parts, _) = request.into_parts();

        let actor = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(actor, Actor::new(id, Role::Freelancer));
        assert!(actor.is_freelancer());
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let mut request = axum::http::Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(JwtClaims::new(Uuid::now_v7(), "x@example.com", "ROOT", 60));
        let (mut parts, _) = request.into_parts();

        let err = Actor::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
