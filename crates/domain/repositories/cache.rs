use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// Shared read-through cache. Keys are fixed strings, never per user.
#[automock]
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<serde_json::Value>;
    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration);
}

/// Returns the cached value for `key`, or runs `compute` and stores its result.
///
/// No lock is held while `compute` runs, so concurrent misses may each recompute.
/// An entry that no longer deserializes into `T` is treated as a miss.
pub async fn get_or_compute<C, T, F, Fut>(
    cache: &C,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T>
where
    C: Cache + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(cached) = cache.get(key).await {
        match serde_json::from_value::<T>(cached) {
            Ok(value) => {
                debug!(key, "cache: hit");
                return Ok(value);
            }
            Err(err) => warn!(key, error = %err, "cache: dropping undecodable entry"),
        }
    }

    debug!(key, "cache: miss, recomputing");
    let value = compute().await?;

    match serde_json::to_value(&value) {
        Ok(json) => cache.put(key, json, ttl).await,
        Err(err) => warn!(key, error = %err, "cache: value not cacheable"),
    }

    Ok(value)
}
