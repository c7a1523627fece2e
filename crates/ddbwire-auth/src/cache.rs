//! Client-owned credential cache.
//!
//! Reads take a shared lock on the cached key. A refresh is serialized behind
//! an async mutex; whoever wins the race fetches, everyone else waiting on the
//! mutex re-checks the cache and reuses the fresh key. A fetch that overlaps
//! an `invalidate` hands its key to the caller but does not cache it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::credentials::{CredentialSource, Credentials};
use crate::error::AuthError;

/// Keys expiring within this many minutes are refreshed before use.
pub const DEFAULT_REFRESH_WINDOW_MINUTES: i64 = 10;

/// Caches the key of an inner source until it is invalidated or about to expire.
pub struct CachedCredentials<S> {
    source: S,
    cached: RwLock<Option<Credentials>>,
    refresh: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    refresh_window: chrono::Duration,
}

impl<S: CredentialSource> CachedCredentials<S> {
    /// Wrap `source` with the default refresh window.
    pub fn new(source: S) -> Self {
        Self::with_refresh_window(
            source,
            chrono::Duration::minutes(DEFAULT_REFRESH_WINDOW_MINUTES),
        )
    }

    /// Wrap `source`, refreshing keys that expire within `refresh_window`.
    pub fn with_refresh_window(source: S, refresh_window: chrono::Duration) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            refresh_window,
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn fresh(&self) -> Option<Credentials> {
        self.cached
            .read()
            .as_ref()
            .filter(|key| !key.expires_within(Utc::now(), self.refresh_window))
            .cloned()
    }
}

impl<S> fmt::Debug for CachedCredentials<S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedCredentials")
            .field("source", &self.source)
            .field("cached", &self.cached.read().is_some())
            .field("refresh_window", &self.refresh_window)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: CredentialSource> CredentialSource for CachedCredentials<S> {
    async fn get_key(&self) -> Result<Option<Credentials>, AuthError> {
        if let Some(key) = self.fresh() {
            return Ok(Some(key));
        }

        let _guard = self.refresh.lock().await;
        if let Some(key) = self.fresh() {
            return Ok(Some(key));
        }

        debug!("refreshing cached credentials");
        let generation = self.generation.load(Ordering::Acquire);
        let key = self.source.get_key().await?;
        let mut cached = self.cached.write();
        if self.generation.load(Ordering::Acquire) == generation {
            cached.clone_from(&key);
        } else {
            debug!("credentials invalidated during refresh, not caching");
        }
        Ok(key)
    }

    fn invalidate(&self) -> bool {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let dropped = self.cached.write().take().is_some();
        let inner = self.source.invalidate();
        debug!(dropped, inner, "invalidated cached credentials");
        dropped || inner
    }

    fn is_disabled(&self) -> bool {
        self.source.is_disabled()
    }
}
