use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection, RunQueryDsl,
};
use signin_types::User;

use crate::models::NewUser;

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    // Parse the connection string and connect with TLS
    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // Spawn the connection task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    AsyncPgConnection::try_from(client).await
}

/// Build the connection pool.
///
/// Connections are negotiated over TLS unless the URL carries
/// `sslmode=disable`, which local development databases usually need.
pub fn establish_connection_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let config = if database_url.contains("sslmode=disable") {
        tracing::warn!("Database TLS disabled by connection string");
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
    } else {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            database_url,
            manager_config,
        )
    };

    let pool = Pool::builder(config).build()?;

    Ok(pool)
}

// User database operations
pub mod users {
    use super::*;

    pub async fn get_by_email(
        conn: &mut AsyncPgConnection,
        email_addr: &str,
    ) -> anyhow::Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let user = users
            .filter(email.eq(email_addr))
            .first::<User>(conn)
            .await
            .optional()?;

        Ok(user)
    }

    /// Insert a user unless one with the same email exists.
    ///
    /// Returns `None` when the row already existed.
    pub async fn create_if_absent(
        conn: &mut AsyncPgConnection,
        name_val: &str,
        email_addr: &str,
    ) -> anyhow::Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let created = diesel::insert_into(users)
            .values(&NewUser {
                name: name_val,
                email: email_addr,
            })
            .on_conflict(email)
            .do_nothing()
            .get_result::<User>(conn)
            .await
            .optional()?;

        Ok(created)
    }

    /// Find the user for `email_addr`, creating it on first sign-in.
    ///
    /// Returns the user and whether it was created by this call.
    pub async fn find_or_create(
        conn: &mut AsyncPgConnection,
        name_val: &str,
        email_addr: &str,
    ) -> anyhow::Result<(User, bool)> {
        if let Some(existing) = get_by_email(conn, email_addr).await? {
            return Ok((existing, false));
        }

        match create_if_absent(conn, name_val, email_addr).await? {
            Some(created) => Ok((created, true)),
            // Lost a race with a concurrent first sign-in for the same email
            None => {
                let existing = get_by_email(conn, email_addr)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", email_addr))?;
                Ok((existing, false))
            }
        }
    }
}
