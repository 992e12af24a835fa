use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Category not found: {0}")]
    NotFound(Uuid),

    #[error("Category with name '{0}' already exists")]
    DuplicateName(String),

    /// At least one task still points at the category
    #[error("Category {0} is used by existing tasks")]
    InUse(Uuid),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CategoryResult<T> = Result<T, CategoryError>;

impl From<sea_orm::DbErr> for CategoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        CategoryError::Internal(format!("Database error: {}", err))
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(id) => AppError::NotFound(format!("Category {} not found", id)),
            CategoryError::DuplicateName(name) => {
                AppError::Conflict(format!("Category with name '{}' already exists", name))
            }
            CategoryError::InUse(_) => AppError::BadRequest(
                "Cannot delete a category that is used by existing tasks".to_string(),
            ),
            CategoryError::Forbidden(msg) => AppError::Forbidden(msg),
            CategoryError::Validation(msg) => AppError::BadRequest(msg),
            CategoryError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
