//! Authentication HTTP handlers.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

use super::{
    flow::{self, AuthFlowError},
    jwt,
    middleware::{build_cookie, read_cookie, removal_cookie},
    nonce::{generate_nonce, generate_state},
    types::{
        AuthMessageResponse, AuthUser, AuthUserResponse, FLOW_COOKIE_MAX_AGE_SECS, NONCE_COOKIE,
        STATE_COOKIE,
    },
};

/// Start Google sign-in.
///
/// Stores fresh `state` and `nonce` values in short-lived cookies and
/// redirects the browser to Google's consent screen.
pub async fn auth_login(State(state): State<AppState>) -> Response {
    let secure = state.auth_config.secure_cookies;

    let csrf_state = generate_state();
    let nonce = generate_nonce();
    let auth_url = state.provider.authorization_url(&csrf_state, &nonce);

    tracing::debug!("Redirecting to Google consent screen");

    (
        StatusCode::FOUND,
        AppendHeaders([
            (header::LOCATION, auth_url),
            (
                header::SET_COOKIE,
                build_cookie(STATE_COOKIE, &csrf_state, FLOW_COOKIE_MAX_AGE_SECS, secure),
            ),
            (
                header::SET_COOKIE,
                build_cookie(NONCE_COOKIE, &nonce, FLOW_COOKIE_MAX_AGE_SECS, secure),
            ),
        ]),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Handle Google's redirect back after consent.
///
/// The state and nonce cookies are cleared whatever the outcome. The session
/// cookie is only set once every check has passed.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<AuthCallbackParams>,
    headers: HeaderMap,
) -> Response {
    let secure = state.auth_config.secure_cookies;
    let cleared = AppendHeaders([
        (header::SET_COOKIE, removal_cookie(STATE_COOKIE, secure)),
        (header::SET_COOKIE, removal_cookie(NONCE_COOKIE, secure)),
    ]);

    match handle_callback_inner(&state, params, &headers).await {
        Ok(response) => (cleared, response).into_response(),
        Err(e) => {
            tracing::warn!("Sign-in callback rejected: {}", e);
            (cleared, e).into_response()
        }
    }
}

async fn handle_callback_inner(
    state: &AppState,
    params: AuthCallbackParams,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let config = &state.auth_config;

    if let Some(error) = params.error {
        return Err(AuthFlowError::Denied(error).into());
    }

    let saved_state = read_cookie(headers, STATE_COOKIE);
    let code = flow::check_state(
        params.code.as_deref(),
        params.state.as_deref(),
        saved_state.as_deref(),
    )?;

    let tokens = state.provider.exchange_code(code).await.map_err(|e| {
        tracing::error!("Token exchange failed: {}", e);
        AuthFlowError::TokenExchange
    })?;
    tracing::debug!(expires_in = ?tokens.expires_in, "Token exchange succeeded");

    let id_token = tokens.id_token.ok_or(AuthFlowError::MissingIdToken)?;

    let claims = state
        .provider
        .verify_id_token(&id_token)
        .await
        .map_err(|e| {
            tracing::warn!("ID token verification failed: {}", e);
            AuthFlowError::IdTokenVerification
        })?;

    let saved_nonce = read_cookie(headers, NONCE_COOKIE);
    flow::check_nonce(claims.nonce.as_deref(), saved_nonce.as_deref())?;

    let identity = flow::verified_identity(&claims)?;
    tracing::info!("OAuth login attempt from: {} (sub {})", identity.email, claims.sub);

    let (user, created) = state
        .users
        .find_or_create(&identity.name, &identity.email)
        .await?;
    if created {
        tracing::info!("Created user {} for {}", user.id, user.email);
    }

    let token = jwt::create_token(config, &user.email, Some(user.name.clone()))
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))?;
    let cookie = build_cookie(
        &config.cookie_name,
        &token,
        config.token_duration_secs,
        config.secure_cookies,
    );

    tracing::info!("Successful login for: {}", user.email);

    Ok((
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(AuthMessageResponse::new("Authentication successful")),
    )
        .into_response())
}

/// Get the signed-in user's stored record.
pub async fn auth_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<AuthUserResponse>> {
    tracing::debug!("Session lookup for {} ({:?})", user.email, user.name);

    let record = state
        .users
        .find_by_email(&user.email)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {}", user.email)))?;

    Ok(Json(record.into()))
}

/// Logout - clear the session cookie.
pub async fn auth_logout(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.auth_config;
    let cookie = removal_cookie(&config.cookie_name, config.secure_cookies);

    (
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(AuthMessageResponse::new("Logged out")),
    )
}
