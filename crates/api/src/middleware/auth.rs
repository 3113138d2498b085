//! Authentication middleware.
//!
//! Accepts `Authorization: Bearer <jwt>` or the session cookie, resolves the
//! session and stores the [`CurrentUser`] in request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::CookieHelper;

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap, cookies: &CookieHelper) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    cookies.session_token(headers).map(str::to_string)
}

async fn authenticate(state: &AppState, token: Option<String>) -> Result<CurrentUser, ApiError> {
    let token =
        token.ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
    Ok(state.auth_service().authenticate(&token).await?)
}

/// Rejects requests without a valid session.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(req.headers(), &state.cookies);
    match authenticate(&state, token).await {
        Ok(user) => {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

/// Like [`require_auth`], and the user must have the `admin` role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(req.headers(), &state.cookies);
    match authenticate(&state, token).await {
        Ok(user) if user.is_admin() => {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(user) => {
            tracing::warn!(user_id = %user.id, path = %req.uri().path(), "Admin route denied");
            ApiError::Forbidden("Admin access required".to_string()).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CookieConfig;
    use axum::http::{header, HeaderValue};

    fn cookies() -> CookieHelper {
        CookieHelper::new(CookieConfig::default(), 3600)
    }

    #[test]
    fn test_bearer_token_is_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(header::COOKIE, HeaderValue::from_static("asp_session=from-cookie"));
        assert_eq!(extract_token(&headers, &cookies()).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; asp_session=tok"));
        assert_eq!(extract_token(&headers, &cookies()).as_deref(), Some("tok"));
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers, &cookies()), None);
    }
}
