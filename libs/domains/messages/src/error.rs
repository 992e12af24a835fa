use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Nobody is assigned yet, so there is no one to talk to
    #[error("Task {0} has no assigned freelancer yet")]
    NoCounterparty(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MessageResult<T> = Result<T, MessageError>;

impl From<sea_orm::DbErr> for MessageError {
    fn from(err: sea_orm::DbErr) -> Self {
        MessageError::Internal(format!("Database error: {}", err))
    }
}

impl From<MessageError> for AppError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::TaskNotFound(id) => AppError::NotFound(format!("Task {} not found", id)),
            MessageError::Forbidden(msg) => AppError::Forbidden(msg),
            err @ MessageError::NoCounterparty(_) => AppError::Conflict(err.to_string()),
            MessageError::Validation(msg) => AppError::BadRequest(msg),
            MessageError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for MessageError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
