//! Checks applied by the sign-in callback, in the order it applies them.
//!
//! Every failure is an [`AuthFlowError`], which the API answers with 400.

use thiserror::Error;

use super::id_token::IdTokenClaims;
use crate::error::ApiError;

/// Reasons a sign-in callback is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthFlowError {
    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("Missing state cookie")]
    MissingStateCookie,

    #[error("Invalid state or code")]
    InvalidStateOrCode,

    #[error("Failed to exchange code for tokens")]
    TokenExchange,

    #[error("ID token not found in response")]
    MissingIdToken,

    #[error("Failed to verify ID token")]
    IdTokenVerification,

    #[error("Invalid nonce")]
    InvalidNonce,

    #[error("ID token has no verified email")]
    UnverifiedEmail,
}

impl From<AuthFlowError> for ApiError {
    fn from(err: AuthFlowError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

/// Identity taken from a verified ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: String,
}

/// Match the returned `state` against the cookie and return the code.
pub fn check_state<'a>(
    code: Option<&'a str>,
    returned_state: Option<&str>,
    saved_state: Option<&str>,
) -> Result<&'a str, AuthFlowError> {
    let saved_state = saved_state
        .filter(|s| !s.is_empty())
        .ok_or(AuthFlowError::MissingStateCookie)?;

    match (code, returned_state) {
        (Some(code), Some(state)) if !code.is_empty() && state == saved_state => Ok(code),
        _ => Err(AuthFlowError::InvalidStateOrCode),
    }
}

/// Match the token's `nonce` against the cookie. Both must be present.
pub fn check_nonce(
    token_nonce: Option<&str>,
    saved_nonce: Option<&str>,
) -> Result<(), AuthFlowError> {
    match (token_nonce, saved_nonce) {
        (Some(token), Some(saved)) if !saved.is_empty() && token == saved => Ok(()),
        _ => Err(AuthFlowError::InvalidNonce),
    }
}

/// Pull the email and display name out of verified claims.
///
/// Tokens without an email, or whose email Google marks unverified, are
/// refused. A missing name falls back to the email.
pub fn verified_identity(claims: &IdTokenClaims) -> Result<VerifiedIdentity, AuthFlowError> {
    let email = claims
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or(AuthFlowError::UnverifiedEmail)?;

    if claims.email_verified == Some(false) {
        return Err(AuthFlowError::UnverifiedEmail);
    }

    let name = claims
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(email);

    Ok(VerifiedIdentity {
        email: email.to_string(),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(email: Option<&str>, verified: Option<bool>, name: Option<&str>) -> IdTokenClaims {
        IdTokenClaims {
            iss: "https://accounts.google.com".to_string(),
            sub: "1".to_string(),
            exp: 0,
            iat: 0,
            email: email.map(str::to_string),
            email_verified: verified,
            name: name.map(str::to_string),
            nonce: None,
        }
    }

    #[test]
    fn test_state_match_returns_code() {
        assert_eq!(check_state(Some("code"), Some("s1"), Some("s1")), Ok("code"));
    }

    #[test]
    fn test_state_mismatch_rejected() {
        assert_eq!(
            check_state(Some("code"), Some("s2"), Some("s1")),
            Err(AuthFlowError::InvalidStateOrCode)
        );
    }

    #[test]
    fn test_missing_code_or_state_rejected() {
        assert_eq!(
            check_state(None, Some("s1"), Some("s1")),
            Err(AuthFlowError::InvalidStateOrCode)
        );
        assert_eq!(
            check_state(Some("code"), None, Some("s1")),
            Err(AuthFlowError::InvalidStateOrCode)
        );
        assert_eq!(
            check_state(Some(""), Some("s1"), Some("s1")),
            Err(AuthFlowError::InvalidStateOrCode)
        );
    }

    #[test]
    fn test_missing_state_cookie_rejected() {
        assert_eq!(
            check_state(Some("code"), Some("s1"), None),
            Err(AuthFlowError::MissingStateCookie)
        );
        assert_eq!(
            check_state(Some("code"), Some(""), Some("")),
            Err(AuthFlowError::MissingStateCookie)
        );
    }

    #[test]
    fn test_nonce_checks() {
        assert_eq!(check_nonce(Some("n1"), Some("n1")), Ok(()));
        assert_eq!(
            check_nonce(Some("n1"), Some("n2")),
            Err(AuthFlowError::InvalidNonce)
        );
        assert_eq!(check_nonce(None, Some("n1")), Err(AuthFlowError::InvalidNonce));
        assert_eq!(check_nonce(Some("n1"), None), Err(AuthFlowError::InvalidNonce));
        assert_eq!(check_nonce(None, None), Err(AuthFlowError::InvalidNonce));
    }

    #[test]
    fn test_identity_uses_name_or_falls_back_to_email() {
        let named = verified_identity(&claims(Some("ada@example.com"), Some(true), Some("Ada")))
            .expect("should accept");
        assert_eq!(named.name, "Ada");

        let unnamed = verified_identity(&claims(Some("ada@example.com"), None, None))
            .expect("should accept");
        assert_eq!(unnamed.name, "ada@example.com");
    }

    #[test]
    fn test_identity_requires_verified_email() {
        assert_eq!(
            verified_identity(&claims(None, Some(true), Some("Ada"))),
            Err(AuthFlowError::UnverifiedEmail)
        );
        assert_eq!(
            verified_identity(&claims(Some("ada@example.com"), Some(false), Some("Ada"))),
            Err(AuthFlowError::UnverifiedEmail)
        );
    }

    #[test]
    fn test_flow_errors_are_bad_requests() {
        let err: ApiError = AuthFlowError::InvalidNonce.into();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "Invalid nonce"));
    }
}
