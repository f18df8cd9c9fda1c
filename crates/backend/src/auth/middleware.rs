//! Cookie helpers and the middleware layer protecting session routes.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::{time::Duration, Cookie, SameSite};

use crate::error::ApiError;
use crate::AppState;

use super::jwt;
use super::types::{AuthConfig, AuthUser, Claims};

/// Middleware function that requires a valid session.
///
/// Use with `axum::middleware::from_fn_with_state`. On success the
/// [`AuthUser`] is available to handlers as an `Extension`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match extract_auth_user(request.headers(), &state.auth_config) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Extract and validate the session user from request headers.
///
/// The session cookie wins over an `Authorization: Bearer` header.
pub fn extract_auth_user(headers: &HeaderMap, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let token = read_cookie(headers, &config.cookie_name)
        .or_else(|| extract_token_from_header(headers))
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication".to_string()))?;

    let claims: Claims = jwt::validate_token(config, &token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    Ok(AuthUser {
        email: claims.sub,
        name: claims.name,
    })
}

/// Value of the cookie called `name`, if the request carries one.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = value.to_str() else {
            continue;
        };
        for cookie_str in cookie_header.split(';') {
            if let Ok(cookie) = Cookie::parse(cookie_str.trim()) {
                if cookie.name() == name {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }

    None
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}

/// Build an HTTP-only, `SameSite=Lax` cookie string.
pub fn build_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_secs))
        .build()
        .to_string()
}

/// Build a cookie string that deletes `name` on the client.
pub fn removal_cookie(name: &str, secure: bool) -> String {
    let mut cookie = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_config;
    use axum::http::HeaderValue;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).expect("valid header"));
        headers
    }

    #[test]
    fn test_read_cookie_finds_named_value() {
        let headers = headers_with(header::COOKIE, "auth_state=abc; auth_nonce=def");
        assert_eq!(read_cookie(&headers, "auth_state").as_deref(), Some("abc"));
        assert_eq!(read_cookie(&headers, "auth_nonce").as_deref(), Some("def"));
        assert_eq!(read_cookie(&headers, "jwt"), None);
    }

    #[test]
    fn test_build_cookie_attributes() {
        let cookie = build_cookie("auth_state", "abc", 600, false);
        assert!(cookie.starts_with("auth_state=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=600"));
        assert!(!cookie.contains("Secure"));

        let secure = build_cookie("jwt", "token", 3600, true);
        assert!(secure.contains("Secure"));
        assert!(secure.contains("Max-Age=3600"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie("auth_nonce", false);
        assert!(cookie.starts_with("auth_nonce=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_extract_from_cookie() {
        let config = test_config();
        let token = jwt::create_token(&config, "ada@example.com", Some("Ada".to_string()))
            .expect("should create token");
        let headers = headers_with(header::COOKIE, &format!("jwt={}", token));

        let user = extract_auth_user(&headers, &config).expect("should authenticate");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_extract_from_bearer_header() {
        let config = test_config();
        let token = jwt::create_token(&config, "ada@example.com", None).expect("should create");
        let headers = headers_with(header::AUTHORIZATION, &format!("Bearer {}", token));

        let user = extract_auth_user(&headers, &config).expect("should authenticate");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_missing_and_invalid_tokens_rejected() {
        let config = test_config();
        assert!(matches!(
            extract_auth_user(&HeaderMap::new(), &config),
            Err(ApiError::Unauthorized(_))
        ));

        let headers = headers_with(header::COOKIE, "jwt=not-a-token");
        assert!(matches!(
            extract_auth_user(&headers, &config),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
