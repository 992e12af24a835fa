//! Users Domain
//!
//! Identity, sessions and account administration for the marketplace.
//!
//! # Features
//!
//! - Registration with email verification by one-time code
//! - Login, password reset and password change (Argon2 hashes)
//! - Self-service profiles
//! - Admin listing, suspension, role changes and deletion
//! - The [`Actor`] extractor every other domain authorizes against
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /auth, /users/me, /admin/users
//! └──────┬──────┘
//!        │
//! ┌──────▼──────────────────┐
//! │ UserService/AdminService│  ← rules, hashing, OTPs; returns Outcome<T>
//! └──────┬──────────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← trait + in-memory and PostgreSQL implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← entities, DTOs, typed filters
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{handlers, AdminService, InMemoryUserRepository, UserService};
//!
//! let repository = Arc::new(InMemoryUserRepository::new());
//! let users = UserService::from_shared(repository.clone());
//! let admin = AdminService::from_shared(repository);
//!
//! let router = Router::new()
//!     .nest("/auth", handlers::auth_router(users.clone(), jwt, effects.clone()))
//!     .nest("/users", handlers::profile_router(users))
//!     .nest("/admin/users", handlers::admin_router(admin, effects));
//! ```

pub mod actor;
pub mod admin;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod otp;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use actor::{Actor, account_status_middleware};
pub use admin::AdminService;
pub use error::{UserError, UserResult};
pub use models::{
    AuthResponse, ListUsersParams, OtpPurpose, Profile, ProfileResponse, RegisterRequest, Role,
    UpdateProfile, UpdateUserStatus, User, UserFilter, UserQuery, UserResponse,
};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
