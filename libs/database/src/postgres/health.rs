use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::common::DatabaseError;

/// Readiness check: runs `SELECT 1`.
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    check_health_timed(db).await.map(|_| ())
}

/// Same as [`check_health`] but reports the round-trip time.
pub async fn check_health_timed(db: &DatabaseConnection) -> Result<Duration, DatabaseError> {
    let start = Instant::now();
    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());

    db.query_one_raw(stmt).await.map_err(|e| {
        DatabaseError::HealthCheckFailed(format!("PostgreSQL health check failed: {}", e))
    })?;

    let elapsed = start.elapsed();
    debug!(elapsed_ms = elapsed.as_millis() as u64, "PostgreSQL health check passed");
    Ok(elapsed)
}
