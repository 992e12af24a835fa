//! PostgreSQL connectivity for the marketplace.
//!
//! - [`postgres::PostgresConfig`] loaded via `core_config::FromEnv`
//! - connection with exponential-backoff retry ([`common::RetryConfig`])
//! - migration runner and `SELECT 1` health check
//!
//! ```ignore
//! use database::postgres;
//!
//! let db = postgres::connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! postgres::run_migrations::<migration::Migrator>(&db, "marketplace_api").await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};
