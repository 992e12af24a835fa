//! # Axum Helpers
//!
//! Shared HTTP plumbing for the marketplace API.
//!
//! - **[`auth`]**: JWT tokens, auth middleware and the [`AuthUser`] extractor
//! - **[`server`]**: router assembly with OpenAPI UIs, health checks, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: [`AppError`] and the `{code, error, message, details}` error body
//! - **[`extractors`]**: [`UuidPath`], [`ValidatedJson`], [`ValidatedQuery`]
//! - **[`envelope`]**: `{success, message?, data}` wrapper and pagination
//! - **[`audit`]**: audit events on the `audit` tracing target

pub mod audit;
pub mod auth;
pub mod envelope;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{AuthUser, JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, close_postgres,
    create_production_app, create_router, health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{UuidPath, ValidatedJson, ValidatedQuery};

pub use envelope::{ApiResponse, Empty, PageParams, Paginated};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
