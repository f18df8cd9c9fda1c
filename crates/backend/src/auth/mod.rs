//! Authentication module for Google sign-in with JWT sessions.
//!
//! This module provides:
//! - The login redirect and callback handlers for Google OpenID Connect
//! - ID token verification against Google's cached JWKS
//! - Session JWT creation and validation
//! - `require_auth` middleware for protecting routes

pub mod flow;
mod handlers;
pub mod id_token;
pub mod jwks;
pub(crate) mod jwt;
mod middleware;
pub mod nonce;
pub mod provider;
pub mod types;

pub use handlers::{auth_callback, auth_login, auth_logout, auth_me};
pub use middleware::require_auth;
pub use provider::{GoogleProvider, IdentityProvider};
