//! Shared application state.
//!
//! Built once in `main` and handed to [`crate::api::routes`], which wires the
//! domain services on top of it. Cloning is cheap: the database handle, JWT
//! keys, effect handler and realtime hub are all reference counted.

use axum_helpers::JwtAuth;
use domain_notifications::EffectHandler;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::realtime::RealtimeHub;

#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded from environment variables
    pub config: Config,
    /// PostgreSQL connection pool
    pub db: DatabaseConnection,
    pub jwt: JwtAuth,
    /// Delivers the outboxes returned by domain services
    pub effects: Arc<dyn EffectHandler>,
    pub hub: Arc<RealtimeHub>,
}
