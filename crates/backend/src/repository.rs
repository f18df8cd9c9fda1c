//! Repository trait for user persistence.
//!
//! Handlers talk to a `UserStore` rather than to a pool directly, so the
//! sign-in pipeline can run against Postgres in production and an in-memory
//! store in tests.

use anyhow::Result;
use async_trait::async_trait;
use signin_types::User;

use crate::db::{self, DbPool};

/// User operations needed by the sign-in flow.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Return the user for `email`, creating it with `name` if absent.
    ///
    /// The boolean is `true` when this call created the row. Existing rows
    /// are never updated.
    async fn find_or_create(&self, name: &str, email: &str) -> Result<(User, bool)>;
}

/// Postgres-backed store
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.pool.get().await?;
        db::users::get_by_email(&mut conn, email).await
    }

    async fn find_or_create(&self, name: &str, email: &str) -> Result<(User, bool)> {
        let mut conn = self.pool.get().await?;
        db::users::find_or_create(&mut conn, name, email).await
    }
}

#[cfg(test)]
pub use memory::InMemoryUserStore;


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_or_create_creates_once() {
        let store = InMemoryUserStore::new();

        let (first, created) = store
            .find_or_create("Ada", "ada@example.com")
            .await
            .expect("should create");
        assert!(created);

        let (second, created) = store
            .find_or_create("Ada Lovelace", "ada@example.com")
            .await
            .expect("should find");
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ada", "existing rows are not updated");
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_find_by_email_missing() {
        let store = InMemoryUserStore::new();
        let found = store
            .find_by_email("nobody@example.com")
            .await
            .expect("lookup should succeed");
        assert!(found.is_none());
    }

    // Compile-time check that the store can sit behind a trait object
    fn _assert_object_safe(_: &dyn UserStore) {}
}
