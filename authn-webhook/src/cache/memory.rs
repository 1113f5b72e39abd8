use super::{CacheBackend, CacheError, CacheKey};
use async_trait::async_trait;
use log::debug;
use moka::future::Cache as MokaCache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// A serialized value together with the lifetime it was written with
#[derive(Clone)]
struct CachedEntry {
    payload: String,
    ttl: Duration,
}

/// Every entry expires on its own clock, restarted by each write.
struct PerEntryExpiry;

impl Expiry<String, CachedEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, CachedEntry>,
}

impl InMemoryCache {
    /// Initialize a new in-memory cache instance
    pub fn new(capacity_mib: usize) -> Result<Self, String> {
        // Convert MiB to bytes for max_capacity (1 MiB = 1024 * 1024 bytes)
        let max_capacity_bytes = u64::try_from(capacity_mib)
            .ok()
            .and_then(|mib| mib.checked_mul(1024 * 1024))
            .ok_or_else(|| format!("Cache capacity of {} MiB is too large", capacity_mib))?;

        let cache = MokaCache::builder()
            .expire_after(PerEntryExpiry)
            .weigher(|key: &String, value: &CachedEntry| -> u32 {
                (key.len() + value.payload.len())
                    .try_into()
                    .unwrap_or(u32::MAX)
            })
            .max_capacity(max_capacity_bytes)
            .build();

        Ok(Self { cache })
    }

    /// Periodically evicts expired entries. Expired entries are never
    /// returned by `get`, the sweep only reclaims their memory.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.run_pending_tasks().await;
                debug!(
                    "Cache sweep finished, {} entries resident",
                    cache.entry_count()
                );
            }
        })
    }

    #[cfg(test)]
    pub(crate) async fn resident_entries(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        self.cache
            .insert(key.as_str().to_string(), CachedEntry { payload, ttl })
            .await;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &CacheKey,
    ) -> Result<Option<T>, CacheError> {
        if let Some(entry) = self.cache.get(key.as_str()).await {
            serde_json::from_str(&entry.payload)
                .map_err(|e| CacheError::Deserialization(e.to_string()))
                .map(Some)
        } else {
            Ok(None)
        }
    }
}
