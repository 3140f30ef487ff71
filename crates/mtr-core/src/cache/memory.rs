//! In-process cache store. Entries vanish with the process.
//!
//! An expiry too far out for the clock to represent is stored as "never".

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

use super::CacheStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_live(expires_at: &Option<Instant>, now: Instant) -> bool {
    expires_at.map_or(true, |at| at > now)
}

fn poisoned() -> anyhow::Error {
    anyhow::anyhow!("memory cache lock poisoned")
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| is_live(expires_at, now))
            .map(|(value, _)| value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| is_live(expires_at, now));
        Ok((before - entries.len()) as u64)
    }
}
