use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod db;
pub mod error;
mod models;
pub mod repository;
mod routes;
mod schema;

use auth::types::AuthConfig;
use auth::{GoogleProvider, IdentityProvider};
use repository::{PgUserStore, UserStore};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub auth_config: Arc<AuthConfig>,
    pub users: Arc<dyn UserStore>,
    pub provider: Arc<dyn IdentityProvider>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    // Establish database connection pool
    let pool = db::establish_connection_pool(&config.database_url)?;

    let state = AppState {
        auth_config: Arc::new(config.auth.clone()),
        users: Arc::new(PgUserStore::new(pool)),
        provider: Arc::new(GoogleProvider::new(config.auth.clone())?),
    };

    let app = routes::build_router(state)
        .layer(routes::build_cors_layer())
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
