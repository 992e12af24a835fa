//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Body parse failures and `Validate` failures are both rendered through
/// [`AppError`], so clients always get the standard error body.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateBid {
///     #[validate(range(min = 1))]
///     amount: i64,
///     #[validate(length(min = 10, max = 5000))]
///     proposal: String,
/// }
///
/// async fn create_bid(ValidatedJson(input): ValidatedJson<CreateBid>) -> String {
///     format!("Bid of {}", input.amount)
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}
