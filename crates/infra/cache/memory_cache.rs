use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{clock::Clock, repositories::cache::Cache};

struct CacheEntry {
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// Process-local TTL cache. Expiry is checked against the injected clock on read.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // Another writer may have refreshed the entry between the two locks.
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            debug!(key, "memory_cache: evicting expired entry");
            entries.remove(key);
        }
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }
}
