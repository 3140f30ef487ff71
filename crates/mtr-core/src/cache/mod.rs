//! Time-expiring cache of successful resolutions.
//!
//! [`CacheStore`] is the get/setex key-value seam (SQLite file or in-process
//! map). [`ResolutionCache`] sits on top: it namespaces keys, applies the TTL
//! and never lets a store failure fail a resolution.

mod memory;
mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheBackend, MtrConfig};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Prefix applied to every embed URL before it reaches the store.
pub const KEY_PREFIX: &str = "token:";

/// Default lifetime of a cached resolution.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Key-value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value for `key` if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`, replacing any previous entry, expiring `ttl` from now.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Drops expired entries. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64>;
}

/// Opens the store selected by `cfg.cache_backend`.
pub async fn open_store(cfg: &MtrConfig) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match cfg.cache_backend {
        CacheBackend::Sqlite => Arc::new(SqliteStore::open_default().await?),
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::debug!(backend = ?cfg.cache_backend, "cache store opened");
    Ok(store)
}

/// Shortest gap between background purges.
const MIN_PURGE_INTERVAL: Duration = Duration::from_secs(1);
/// Longest gap between background purges.
const MAX_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Background task removing expired entries every `every` (clamped to 1 s..1 h).
/// Long-running processes use it so the store does not keep every key it ever saw.
pub fn spawn_purger(store: Arc<dyn CacheStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    let every = every.clamp(MIN_PURGE_INTERVAL, MAX_PURGE_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "purged expired cache entries"),
                Err(e) => tracing::warn!("cache purge failed: {:#}", e),
            }
        }
    })
}

/// Cache-aside view keyed by embed URL (used verbatim, no normalization).
#[derive(Clone)]
pub struct ResolutionCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_ttl(store, DEFAULT_TTL)
    }

    pub fn with_ttl(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn key_for(embed_url: &str) -> String {
        format!("{KEY_PREFIX}{embed_url}")
    }

    /// Cached media URL for `embed_url`. A failing store reads as a miss.
    pub async fn get(&self, embed_url: &str) -> Option<String> {
        match self.store.get(&Self::key_for(embed_url)).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(embed_url, "cache read failed, treating as miss: {:#}", e);
                None
            }
        }
    }

    /// Stores `media_url` with the cache's TTL.
    pub async fn put(&self, embed_url: &str, media_url: &str) {
        self.put_with_ttl(embed_url, media_url, self.ttl).await
    }

    /// Stores `media_url` expiring `ttl` from now. A failing store is logged and ignored.
    pub async fn put_with_ttl(&self, embed_url: &str, media_url: &str, ttl: Duration) {
        if let Err(e) = self
            .store
            .set_ex(&Self::key_for(embed_url), media_url, ttl)
            .await
        {
            tracing::warn!(embed_url, "cache write failed: {:#}", e);
        }
    }
}
