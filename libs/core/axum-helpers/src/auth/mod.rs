//! Authentication.
//!
//! - [`JwtConfig`]: secret and token lifetime from the environment
//! - [`JwtAuth`]: HS256 access token creation and verification
//! - [`jwt_auth_middleware`]: decodes the token (if any) into request extensions
//! - [`AuthUser`]: extractor for handlers that require an authenticated caller
//!
//! ```ignore
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let app = Router::new()
//!     .route("/users/me", get(me))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//!
//! async fn me(user: AuthUser) -> String {
//!     user.email
//! }
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod user;

pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::{extract_token, jwt_auth_middleware};
pub use user::AuthUser;
