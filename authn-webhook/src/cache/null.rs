use super::{CacheBackend, CacheError, CacheKey};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// NullCache is a cache implementation that does nothing.
/// It is used when caching is disabled, every lookup goes upstream.
#[derive(Clone, Debug)]
pub struct NullCache;

impl NullCache {
    /// Create a new NullCache instance
    pub fn new() -> Self {
        NullCache
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        _key: &CacheKey,
        _value: &T,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        _key: &CacheKey,
    ) -> Result<Option<T>, CacheError> {
        Ok(None)
    }
}
