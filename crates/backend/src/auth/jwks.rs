//! JWKS (JSON Web Key Set) fetching and caching.

use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// How long a fetched key set is trusted before it is refetched
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Minimum gap between fetches triggered by an unknown `kid`
/// (at most ten fetches a minute)
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(6);

/// Upper bound on a single key set fetch
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("failed to fetch JWKS: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("JWKS fetch timed out after {0:?}")]
    Timeout(Duration),
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Cached view of a remote key set.
///
/// Lookups only ever hold `cached` briefly. Fetches are serialized on
/// `refresh`, so a slow endpoint never blocks a lookup the cache can answer.
pub struct JwksCache {
    http: Client,
    uri: String,
    fetch_timeout: Duration,
    cached: RwLock<Option<CachedKeys>>,
    refresh: Mutex<()>,
}

impl JwksCache {
    pub fn new(http: Client, uri: impl Into<String>) -> Self {
        Self {
            http,
            uri: uri.into(),
            fetch_timeout: FETCH_TIMEOUT,
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    #[cfg(test)]
    fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Return a key set that should contain `kid`.
    ///
    /// Serves from cache while fresh and holding `kid`. An unknown `kid`
    /// triggers a refetch (keys may have rotated), unless the cache was
    /// filled within the rate-limit window; then the cached set is returned
    /// and the lookup fails downstream.
    pub async fn keys_for(&self, kid: &str) -> Result<JwkSet, JwksError> {
        if let Some(keys) = self.cached_for(kid, false).await {
            return Ok(keys);
        }

        let _refresh = self.refresh.lock().await;
        // Another request may have refreshed while we waited for the lock
        if let Some(keys) = self.cached_for(kid, true).await {
            return Ok(keys);
        }

        tracing::debug!("Fetching JWKS from {}", self.uri);
        let keys = tokio::time::timeout(self.fetch_timeout, self.fetch())
            .await
            .map_err(|_| JwksError::Timeout(self.fetch_timeout))??;
        tracing::info!("Fetched {} signing keys", keys.keys.len());

        *self.cached.write().await = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });

        Ok(keys)
    }

    /// Cached keys, if they can answer for `kid` without a fetch.
    ///
    /// With `recent`, any set fetched inside the rate-limit window counts,
    /// even when it lacks `kid`.
    async fn cached_for(&self, kid: &str, recent: bool) -> Option<JwkSet> {
        let cached = self.cached.read().await;
        let entry = cached.as_ref()?;
        let age = entry.fetched_at.elapsed();
        let usable = if recent {
            age < MIN_REFETCH_INTERVAL
        } else {
            age < CACHE_TTL && (entry.keys.find(kid).is_some() || age < MIN_REFETCH_INTERVAL)
        };
        usable.then(|| entry.keys.clone())
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        let keys = self
            .http
            .get(&self.uri)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;

        Ok(keys)
    }

    #[cfg(test)]
    pub(crate) async fn seed(&self, keys: JwkSet, fetched_at: Instant) {
        *self.cached.write().await = Some(CachedKeys { keys, fetched_at });
    }
}
