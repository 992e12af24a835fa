use axum_helpers::JwtAuth;
use axum_helpers::server::{close_postgres, create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::{
    EffectDispatcher, EmailProvider, LogEmailProvider, Mailer, NotificationService,
    PgNotificationRepository, SmtpProvider,
};
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod openapi;
mod realtime;
mod state;

use config::Config;
use realtime::RealtimeHub;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before any fallible operation so startup errors get the colored report
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.marketplace.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
            .await
            .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
    }

    let provider: Arc<dyn EmailProvider> = match config.smtp.clone() {
        Some(smtp) => {
            info!(host = %smtp.host, port = smtp.port, "Sending email over SMTP");
            Arc::new(SmtpProvider::new(smtp)?)
        }
        None => {
            info!("SMTP_HOST not set, emails will only be logged");
            Arc::new(LogEmailProvider::new())
        }
    };
    let mailer = Mailer::new(provider)?;

    let hub = Arc::new(RealtimeHub::default());
    let effects = Arc::new(EffectDispatcher::new(
        NotificationService::new(PgNotificationRepository::new(db.clone())),
        mailer,
        hub.clone(),
    ));

    let state = AppState {
        jwt: JwtAuth::new(&config.jwt),
        config,
        db,
        effects,
        hub,
    };

    let api_routes = api::routes(&state)?;

    // create_router nests under /api and adds docs, CORS, tracing and compression
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    // - /health: liveness with app name/version
    // - /ready: database round trip
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(
        fee_bps = state.config.marketplace.platform_fee_bps,
        "Starting marketplace API"
    );

    let server = state.config.server.clone();
    create_production_app(app, &server, async move {
        info!("Shutting down: closing database connections");
        close_postgres(state.db, "marketplace").await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Marketplace API shutdown complete");
    Ok(())
}
