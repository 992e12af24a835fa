use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    #[error("Bid not found: {0}")]
    BidNotFound(Uuid),

    #[error("Milestone not found: {0}")]
    MilestoneNotFound(Uuid),

    #[error("No transaction with provider reference '{0}'")]
    TransactionNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity is not in the state the operation needs
    #[error("{0}")]
    InvalidState(String),

    #[error("You already have a pending bid on this task")]
    DuplicateBid,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type TaskResult<T> = Result<T, TaskError>;

impl TaskError {
    pub(crate) fn forbidden(msg: &str) -> Self {
        TaskError::Forbidden(msg.to_string())
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        TaskError::InvalidState(msg.into())
    }
}

/// Convert TaskError to AppError for standardized error responses
impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(id) => AppError::NotFound(format!("Task {} not found", id)),
            TaskError::BidNotFound(id) => AppError::NotFound(format!("Bid {} not found", id)),
            TaskError::MilestoneNotFound(id) => {
                AppError::NotFound(format!("Milestone {} not found", id))
            }
            TaskError::TransactionNotFound(reference) => {
                AppError::NotFound(format!("Transaction '{}' not found", reference))
            }
            TaskError::CategoryNotFound(id) => {
                AppError::NotFound(format!("Category {} not found", id))
            }
            TaskError::UserNotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            TaskError::Unauthorized(msg) => AppError::Unauthorized(msg),
            TaskError::Forbidden(msg) => AppError::Forbidden(msg),
            TaskError::InvalidState(msg) => AppError::Conflict(msg),
            err @ TaskError::DuplicateBid => AppError::Conflict(err.to_string()),
            TaskError::Validation(msg) => AppError::BadRequest(msg),
            TaskError::Payment(msg) => AppError::ServiceUnavailable(msg),
            TaskError::Internal(msg) => AppError::InternalServerError(msg),
            TaskError::Database(msg) => {
                AppError::InternalServerError(format!("Database error: {}", msg))
            }
        }
    }
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<sea_orm::DbErr> for TaskError {
    fn from(err: sea_orm::DbErr) -> Self {
        TaskError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_state_errors_are_conflicts() {
        let response = TaskError::invalid_state("Task is not open for bidding").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            TaskError::DuplicateBid.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_missing_references_are_not_found() {
        let response = TaskError::CategoryNotFound(Uuid::now_v7()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = TaskError::UserNotFound(Uuid::now_v7()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
