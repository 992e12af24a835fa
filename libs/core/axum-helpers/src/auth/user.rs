use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Authenticated caller, taken from the claims that
/// [`jwt_auth_middleware`](super::jwt_auth_middleware) placed in the request.
///
/// Rejects with 401 when the request carried no valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl TryFrom<&JwtClaims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: &JwtClaims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))?;

        Ok(Self {
            id,
            email: claims.email.clone(),
            role: claims.role.clone(),
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<JwtClaims>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        AuthUser::try_from(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn claims(sub: &str) -> JwtClaims {
        JwtClaims {
            sub: sub.to_string(),
            email: "f@example.com".into(),
            role: "FREELANCER".into(),
            exp: 0,
            iat: 0,
            jti: "j".into(),
        }
    }

    #[tokio::test]
    async fn test_extracts_from_extensions() {
        let id = Uuid::now_v7();
        let mut request = Request::builder().body(()).unwrap();
        request.extensions_mut().insert(claims(&id.to_string()));
        let (mut parts, _) = request.into_parts();

        let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, "FREELANCER");
    }

    #[tokio::test]
    async fn test_missing_claims_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_non_uuid_subject_is_unauthorized() {
        assert!(AuthUser::try_from(&claims("user-42")).is_err());
    }
}
