use crate::config::{CacheConfig, CacheStore};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod null;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// The two result classes kept in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Identity,
    Membership,
}

impl LookupKind {
    fn prefix(&self) -> &'static str {
        match self {
            LookupKind::Identity => "identity",
            LookupKind::Membership => "membership",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Cache key of one lookup of one credential.
///
/// The credential itself never appears in the key, only its SHA-256 digest,
/// so keys are safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns `None` for an empty credential, which would otherwise collapse
    /// every caller onto one shared entry.
    pub fn for_credential(kind: LookupKind, credential: &str) -> Option<Self> {
        if credential.is_empty() {
            return None;
        }
        let digest = Sha256::digest(credential.as_bytes());
        Some(Self(format!("{}:{:x}", kind.prefix(), digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache trait defining the interface for all cache implementations.
///
/// Implementations must be safe to share between any number of concurrent
/// requests (Send + Sync) and cheap to clone.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store a value that expires `ttl` after this write
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Retrieve a value that has not expired yet
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &CacheKey,
    ) -> Result<Option<T>, CacheError>;
}

/// Cache implementation that provides a uniform interface regardless of backend.
#[derive(Clone)]
pub enum Cache {
    /// In-memory cache implementation using Moka
    InMemory(memory::InMemoryCache),
    /// No-op cache implementation that doesn't actually cache anything
    Null(null::NullCache),
}

#[async_trait::async_trait]
impl CacheBackend for Cache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.set(key, value, ttl).await,
            Self::Null(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &CacheKey,
    ) -> Result<Option<T>, CacheError> {
        match self {
            Self::InMemory(cache) => cache.get(key).await,
            Self::Null(cache) => cache.get(key).await,
        }
    }
}

/// Creates the configured cache and starts its sweeper.
pub async fn create_cache(config: &CacheConfig) -> Result<Cache, CacheError> {
    match config.store().map_err(CacheError::Config)? {
        CacheStore::InMemory => {
            let cache = memory::InMemoryCache::new(config.capacity).map_err(CacheError::Config)?;
            cache.spawn_sweeper(config.sweep_interval());
            Ok(Cache::InMemory(cache))
        }
        CacheStore::None => Ok(Cache::Null(null::NullCache::new())),
    }
}

/// Looks up a previous result for this credential.
///
/// Cache failures are logged and reported as a miss.
pub async fn lookup<T: DeserializeOwned + Send + Sync>(
    cache: &Cache,
    kind: LookupKind,
    credential: &str,
) -> Option<T> {
    let Some(key) = CacheKey::for_credential(kind, credential) else {
        warn!("Invalid cache key for {} lookup, skipping cache", kind);
        return None;
    };

    match cache.get::<T>(&key).await {
        Ok(Some(cached)) => {
            debug!("Cache hit for key: {}", key);
            Some(cached)
        }
        Ok(None) => {
            debug!("Cache miss for key: {}", key);
            None
        }
        Err(cache_err) => {
            warn!("Cache error for key {}: {}", key, cache_err);
            None
        }
    }
}

/// Stores a result for this credential; failures are logged, never returned.
pub async fn store<T: Serialize + Send + Sync>(
    cache: &Cache,
    kind: LookupKind,
    credential: &str,
    value: &T,
    ttl: Duration,
) {
    let Some(key) = CacheKey::for_credential(kind, credential) else {
        warn!("Invalid cache key for {} lookup, not caching result", kind);
        return;
    };

    if let Err(cache_err) = cache.set(&key, value, ttl).await {
        warn!("Failed to cache result for {}: {}", key, cache_err);
    }
}
