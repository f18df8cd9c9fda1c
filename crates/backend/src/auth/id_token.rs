//! ID token verification against a JSON Web Key Set.

use jsonwebtoken::{
    decode, decode_header, errors::Error as JwtError, jwk::JwkSet, Algorithm, DecodingKey,
    Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Issuer values Google puts in `iss`
pub const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

/// Clock skew tolerated on `exp`, in seconds
const LEEWAY_SECS: u64 = 60;

/// Claims read from a verified Google ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdTokenError {
    #[error("malformed token header: {0}")]
    MalformedHeader(#[source] JwtError),

    #[error("token header has no kid")]
    MissingKeyId,

    #[error("unsupported algorithm {0:?}, expected RS256")]
    UnsupportedAlgorithm(Algorithm),

    #[error("no signing key with kid {0}")]
    KeyNotFound(String),

    #[error("unusable signing key: {0}")]
    InvalidKey(#[source] JwtError),

    #[error("token rejected: {0}")]
    Rejected(#[source] JwtError),
}

/// Read the `kid` from an unverified token header.
pub fn key_id(id_token: &str) -> Result<String, IdTokenError> {
    let header = decode_header(id_token).map_err(IdTokenError::MalformedHeader)?;
    header.kid.ok_or(IdTokenError::MissingKeyId)
}

/// Verify signature, audience, issuer and expiry of an ID token.
///
/// The nonce is returned in the claims and checked by the caller, which
/// holds the value issued at login.
pub fn verify_id_token(
    id_token: &str,
    jwks: &JwkSet,
    client_id: &str,
) -> Result<IdTokenClaims, IdTokenError> {
    let header = decode_header(id_token).map_err(IdTokenError::MalformedHeader)?;

    if header.alg != Algorithm::RS256 {
        return Err(IdTokenError::UnsupportedAlgorithm(header.alg));
    }

    let kid = header.kid.ok_or(IdTokenError::MissingKeyId)?;
    let jwk = jwks
        .find(&kid)
        .ok_or_else(|| IdTokenError::KeyNotFound(kid.clone()))?;
    let key = DecodingKey::from_jwk(jwk).map_err(IdTokenError::InvalidKey)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[client_id]);
    validation.set_issuer(&GOOGLE_ISSUERS);
    validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
    validation.leeway = LEEWAY_SECS;

    let data = decode::<IdTokenClaims>(id_token, &key, &validation)
        .map_err(IdTokenError::Rejected)?;

    Ok(data.claims)
}

#[cfg(test)]
pub(crate) mod test_keys {
    //! RSA key pair used to sign ID tokens in tests.

    use jsonwebtoken::{encode, jwk::JwkSet, Algorithm, EncodingKey, Header};
    use serde_json::json;

    pub const TEST_KID: &str = "test-signing-key";

    const PRIVATE_KEY_PEM: &[u8] = include_bytes!("testdata/id_token_signing_key.pem");

    const MODULUS: &str = "lr-ehYnsOrofo79lz2vSpyIOZzz4yaTbD1JWOHKr-KvEAysIlvKfwz0DXZBfGeIIH_QM5iao2H4384R_cMkhrr17VsJssgYlyogaz9jSOG8Xpo3qpkhAI0Bx_l_qAiCXX9Hc48J6rlVLVR860g9yWWHFHhXdAV3UQlA6lcrxkiFbeJ4_6GBwLyUVG2FKQGtXp0vT8OXX1RV8dhHdFsj3YxO0WINePQpuhQU3CyJRy9-qc3vzUSI8DKJ8kwILr2v2wEHFUeAqGoTwzYPgwD5GWHesCmOB0aap7mrqKBBKK1xDbitT_KEgVhHMNRKLhsvw-Tgya_C4dAmiQZDvriQusw";

    pub fn jwks() -> JwkSet {
        serde_json::from_value(json!({
            "keys": [{
                "kty": "RSA",
                "kid": TEST_KID,
                "use": "sig",
                "alg": "RS256",
                "n": MODULUS,
                "e": "AQAB",
            }]
        }))
        .expect("test JWKS should parse")
    }

    pub fn sign(claims: &serde_json::Value, kid: Option<&str>) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM).expect("test key should load");
        encode(&header, claims, &key).expect("should sign test token")
    }
}
