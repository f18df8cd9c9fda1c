use crate::auth::types::AuthConfig;
use crate::error::ApiError;

/// Server configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &"<redacted>")
            .field("auth", &self.auth)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ApiError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ApiError::Config(format!("PORT is not a valid port: {}", raw)))?,
            Err(_) => 3000,
        };

        Ok(Self {
            port,
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ApiError::missing_env("DATABASE_URL"))?,
            auth: AuthConfig::from_env()?,
        })
    }
}
