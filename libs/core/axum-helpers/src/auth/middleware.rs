use super::jwt::JwtAuth;
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Find a bearer token in the `Authorization` header, the `access_token`
/// cookie, or the `token` query parameter (used by WebSocket clients).
pub fn extract_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("cookie")
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        let (name, value) = cookie.trim().split_once('=')?;
                        (name == "access_token").then(|| value.to_string())
                    })
                })
        })
        .or_else(|| {
            query?.split('&').find_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (name == "token").then(|| value.to_string())
            })
        })
        .filter(|t| !t.is_empty())
}

/// JWT authentication middleware.
///
/// Requests without a token pass through anonymously; handlers that need an
/// identity use the [`AuthUser`](super::AuthUser) extractor, which rejects them.
/// A token that is present but invalid or expired is rejected here with 401.
/// On success the decoded [`JwtClaims`](super::JwtClaims) are inserted into
/// the request extensions.
///
/// ```ignore
/// let app = Router::new()
///     .merge(api_routes)
///     .layer(axum::middleware::from_fn_with_state(jwt_auth, jwt_auth_middleware));
/// ```
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers(), request.uri().query()) else {
        return next.run(request).await;
    };

    match auth.verify_token(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("JWT verification failed: {}", e);
            AppError::Unauthorized("Invalid or expired token".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("cookie", HeaderValue::from_static("access_token=cookie"));

        assert_eq!(
            extract_token(&headers, Some("token=query")).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; access_token=from-cookie"),
        );
        assert_eq!(
            extract_token(&headers, None).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn test_query_fallback_for_websockets() {
        let headers = HeaderMap::new();
        assert_eq!(
            extract_token(&headers, Some("room=x&token=from-query")).as_deref(),
            Some("from-query")
        );
        assert_eq!(extract_token(&headers, Some("token=")), None);
        assert_eq!(extract_token(&headers, None), None);
    }
}
