//! Identity provider seam: code exchange and ID token verification.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id_token::{self, IdTokenClaims, IdTokenError};
use super::jwks::{JwksCache, JwksError, FETCH_TIMEOUT};
use super::nonce::build_auth_url;
use super::types::AuthConfig;

/// Google's OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Token endpoint response. Only `id_token` matters for sign-in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("token endpoint request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error(transparent)]
    Jwks(#[from] JwksError),

    #[error(transparent)]
    IdToken(#[from] IdTokenError),
}

/// External OIDC provider the callback talks to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the consent screen for this sign-in attempt.
    fn authorization_url(&self, state: &str, nonce: &str) -> String;

    /// Exchange an authorization code at the token endpoint.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ProviderError>;

    /// Verify an ID token's signature and standard claims.
    async fn verify_id_token(&self, id_token: &str) -> Result<IdTokenClaims, ProviderError>;
}

/// Google as the identity provider
pub struct GoogleProvider {
    config: AuthConfig,
    http: Client,
    jwks: JwksCache,
    token_url: String,
}

impl GoogleProvider {
    pub fn new(config: AuthConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        let jwks = JwksCache::new(http.clone(), config.google_jwks_uri.clone());
        Ok(Self {
            config,
            http,
            jwks,
            token_url: GOOGLE_TOKEN_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, state: &str, nonce: &str) -> String {
        build_auth_url(&self.config, state, nonce)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ProviderError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&TokenRequest {
                code,
                client_id: &self.config.google_client_id,
                client_secret: &self.config.google_client_secret,
                redirect_uri: &self.config.google_redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::TokenEndpoint { status, body });
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    async fn verify_id_token(&self, token: &str) -> Result<IdTokenClaims, ProviderError> {
        let kid = id_token::key_id(token)?;
        let keys = self.jwks.keys_for(&kid).await?;
        let claims = id_token::verify_id_token(token, &keys, &self.config.google_client_id)?;
        Ok(claims)
    }
}
