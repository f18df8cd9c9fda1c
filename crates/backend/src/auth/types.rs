//! Auth-related types and configuration.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// Re-export shared types for convenience
pub use signin_types::{AuthMessageResponse, AuthUserResponse};

/// Default location of Google's signing keys
pub const DEFAULT_GOOGLE_JWKS_URI: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Cookie carrying the anti-forgery `state` between login and callback
pub const STATE_COOKIE: &str = "auth_state";

/// Cookie carrying the OIDC `nonce` between login and callback
pub const NONCE_COOKIE: &str = "auth_nonce";

/// Lifetime of the state and nonce cookies (10 minutes)
pub const FLOW_COOKIE_MAX_AGE_SECS: i64 = 10 * 60;

/// Session JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// User display name from Google
    pub name: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Validated user from the session JWT
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: String,
    pub name: Option<String>,
}

/// Auth configuration loaded from environment
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_duration_secs: i64,
    pub cookie_name: String,
    pub secure_cookies: bool,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_redirect_uri: String,
    pub google_jwks_uri: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_duration_secs", &self.token_duration_secs)
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookies", &self.secure_cookies)
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &"<redacted>")
            .field("google_redirect_uri", &self.google_redirect_uri)
            .field("google_jwks_uri", &self.google_jwks_uri)
            .finish()
    }
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// Required env vars:
    /// - `JWT_SECRET`: Secret key for signing session JWTs
    /// - `GOOGLE_CLIENT_ID`: Google OAuth client ID
    /// - `GOOGLE_CLIENT_SECRET`: Google OAuth client secret
    /// - `GOOGLE_REDIRECT_URI`: OAuth callback URI registered with Google
    ///
    /// Optional:
    /// - `GOOGLE_JWKS_URI`: defaults to [`DEFAULT_GOOGLE_JWKS_URI`]
    /// - `RUST_ENV`: `production` marks every cookie `Secure`
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let required = |name: &str| {
            var(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ApiError::missing_env(name))
        };

        Ok(Self {
            jwt_secret: required("JWT_SECRET")?,
            token_duration_secs: 60 * 60,
            cookie_name: "jwt".to_string(),
            secure_cookies: var("RUST_ENV").as_deref() == Some("production"),
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            google_redirect_uri: required("GOOGLE_REDIRECT_URI")?,
            google_jwks_uri: var("GOOGLE_JWKS_URI")
                .unwrap_or_else(|| DEFAULT_GOOGLE_JWKS_URI.to_string()),
        })
    }
}
