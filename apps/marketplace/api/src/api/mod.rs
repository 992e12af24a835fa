use axum::{Router, middleware, routing::get};
use axum_helpers::jwt_auth_middleware;
use chrono::Duration;
use domain_categories::{CategoryService, PgCategoryRepository};
use domain_messages::{MessageService, PgMessageRepository};
use domain_notifications::{NotificationService, PgNotificationRepository};
use domain_tasks::{
    BidService, FeePolicy, InProcessGateway, MilestoneService, PgTaskRepository, TaskService,
    TasksState, WebhookVerifier,
};
use domain_users::{
    AdminService, PgUserRepository, UserRepository, UserService, account_status_middleware,
};
use std::sync::Arc;

use crate::realtime;
use crate::state::AppState;

pub mod health;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix is added by the `create_router` helper.
///
/// Every domain service is built here on top of the shared connection pool.
/// The JWT layer wraps all routes: anonymous requests pass through and the
/// `Actor` extractor rejects them where an identity is required. Inside it the
/// account layer refuses tokens of suspended or deleted users.
pub fn routes(state: &AppState) -> eyre::Result<Router> {
    let db = &state.db;
    let effects = state.effects.clone();
    let settings = &state.config.marketplace;

    let user_repository = Arc::new(PgUserRepository::new(db.clone()));
    let users = UserService::from_shared(user_repository.clone())
        .with_otp_ttl(Duration::minutes(settings.otp_ttl_minutes));
    let accounts: Arc<dyn UserRepository> = user_repository.clone();
    let admin = AdminService::from_shared(user_repository);

    let categories = CategoryService::new(PgCategoryRepository::new(db.clone()));

    let mut gateway = InProcessGateway::new();
    if let Some(url) = &settings.payment_return_url {
        gateway = gateway.with_return_url(url.clone());
    }
    let fees = FeePolicy::from_bps(settings.platform_fee_bps)
        .map_err(|e| eyre::eyre!("Invalid PLATFORM_FEE_BPS: {}", e))?;
    let task_repository = Arc::new(PgTaskRepository::new(db.clone()));
    let tasks = TasksState::new(
        TaskService::from_shared(task_repository.clone()),
        BidService::from_shared(task_repository.clone()),
        MilestoneService::from_shared(task_repository, Arc::new(gateway)).with_fee_policy(fees),
        effects.clone(),
    )
    .with_webhook_verifier(match &settings.payment_webhook_secret {
        Some(secret) => WebhookVerifier::new(secret),
        None => {
            tracing::warn!("PAYMENT_WEBHOOK_SECRET not set, payment webhooks will be refused");
            WebhookVerifier::disabled()
        }
    });

    let messages = MessageService::new(PgMessageRepository::new(db.clone()));
    let notifications = NotificationService::new(PgNotificationRepository::new(db.clone()));

    let router = Router::new()
        .nest(
            "/auth",
            domain_users::handlers::auth_router(users.clone(), state.jwt.clone(), effects.clone()),
        )
        .nest("/users", domain_users::handlers::profile_router(users))
        .nest(
            "/admin/users",
            domain_users::handlers::admin_router(admin, effects.clone()),
        )
        .nest(
            "/categories",
            domain_categories::handlers::router(categories),
        )
        .merge(domain_tasks::router(tasks))
        .nest(
            "/messages",
            domain_messages::handlers::router(messages.clone(), effects),
        )
        .nest(
            "/notifications",
            domain_notifications::handlers::router(notifications),
        )
        .merge(realtime::router(state.hub.clone(), Arc::new(messages)))
        // Added first so it runs after the JWT layer has decoded the claims
        .layer(middleware::from_fn_with_state(
            accounts,
            account_status_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            jwt_auth_middleware,
        ));

    Ok(router)
}

/// Creates a router with the /ready endpoint that performs actual health checks.
///
/// This router has state applied and can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
