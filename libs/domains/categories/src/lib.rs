//! Categories Domain
//!
//! Reference data that classifies tasks. Reads are public; create, rename
//! and delete need an admin. A category cannot be deleted while any task
//! still points at it.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CategoryError, CategoryResult};
pub use models::{Category, CreateCategory, UpdateCategory};
pub use postgres::PgCategoryRepository;
pub use repository::{CategoryRepository, InMemoryCategoryRepository};
pub use service::CategoryService;
