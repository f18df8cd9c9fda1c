//! Anti-forgery values and the Google authorization URL.

use rand::RngCore;

use super::types::AuthConfig;

/// Google's OAuth 2.0 authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Scopes requested at sign-in
pub const LOGIN_SCOPES: [&str; 3] = ["openid", "email", "profile"];

fn random_hex_32() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate the CSRF `state` parameter.
pub fn generate_state() -> String {
    random_hex_32()
}

/// Generate the OIDC `nonce` bound into the ID token.
pub fn generate_nonce() -> String {
    random_hex_32()
}

/// Build the consent-screen URL carrying `state` and `nonce`.
pub fn build_auth_url(config: &AuthConfig, state: &str, nonce: &str) -> String {
    format!(
        "{}?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         scope={}&\
         state={}&\
         nonce={}&\
         access_type=offline",
        GOOGLE_AUTH_URL,
        urlencoding::encode(&config.google_client_id),
        urlencoding::encode(&config.google_redirect_uri),
        urlencoding::encode(&LOGIN_SCOPES.join(" ")),
        urlencoding::encode(state),
        urlencoding::encode(nonce),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_config;

    #[test]
    fn test_generated_values_are_64_hex_chars() {
        let state = generate_state();
        let nonce = generate_nonce();

        assert_eq!(state.len(), 64);
        assert_eq!(nonce.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, nonce);
        assert_ne!(generate_state(), state);
    }

    #[test]
    fn test_auth_url_embeds_parameters() {
        let config = test_config();
        let url = build_auth_url(&config, "abc123", "def456");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=test-client.apps.googleusercontent.com"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("nonce=def456"));
        assert!(url.contains("access_type=offline"));
    }
}
