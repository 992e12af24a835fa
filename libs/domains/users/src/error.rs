use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid or expired code")]
    InvalidOtp,

    #[error("Email already verified")]
    EmailAlreadyVerified,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("Account is suspended")]
    Suspended,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        UserError::Internal(format!("Database error: {}", err))
    }
}

/// Map an insert/update error, turning the email unique index into a
/// [`UserError::DuplicateEmail`].
pub(crate) fn map_write_err(err: DbErr, email: &str) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::DuplicateEmail(email.to_string()),
        _ => err.into(),
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            UserError::DuplicateEmail(email) => {
                AppError::Conflict(format!("User with email '{}' already exists", email))
            }
            UserError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::InvalidOtp => AppError::BadRequest("Invalid or expired code".to_string()),
            UserError::EmailAlreadyVerified => {
                AppError::BadRequest("Email address has already been verified".to_string())
            }
            UserError::EmailNotVerified => {
                AppError::Forbidden("Please verify your email address first".to_string())
            }
            UserError::Suspended => AppError::Forbidden("Account is suspended".to_string()),
            UserError::Forbidden(msg) => AppError::Forbidden(msg),
            UserError::PasswordHash(msg) => {
                tracing::error!("Password hash error: {}", msg);
                AppError::InternalServerError(msg)
            }
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (UserError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (UserError::DuplicateEmail("a@b.co".into()), StatusCode::CONFLICT),
            (UserError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (UserError::InvalidOtp, StatusCode::BAD_REQUEST),
            (UserError::EmailNotVerified, StatusCode::FORBIDDEN),
            (UserError::Suspended, StatusCode::FORBIDDEN),
            (UserError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
