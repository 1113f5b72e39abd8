use confique::Config;
use std::str::FromStr;
use std::time::Duration;

/// Specifies which cache store implementation to use
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CacheStore {
    #[default]
    InMemory,
    None,
}

impl FromStr for CacheStore {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "in-memory" => Ok(CacheStore::InMemory),
            "none" => Ok(CacheStore::None),
            other => Err(format!(
                "Unknown cache store '{}', expected 'in-memory' or 'none'",
                other
            )),
        }
    }
}

/// Configuration for the lookup cache
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Cache store type: "in-memory" (default) or "none"
    #[config(env = "AUTHN_CACHE_STORE", default = "in-memory")]
    pub store: String,

    /// Lifetime of cached account identities in seconds (default: 1 hour)
    #[config(env = "AUTHN_CACHE_IDENTITY_TTL", default = 3600)]
    pub identity_ttl: u64,

    /// Lifetime of cached team memberships in seconds (default: 10 minutes)
    #[config(env = "AUTHN_CACHE_MEMBERSHIP_TTL", default = 600)]
    pub membership_ttl: u64,

    /// Interval between sweeps of expired entries in seconds (default: 90 minutes)
    #[config(env = "AUTHN_CACHE_SWEEP_INTERVAL", default = 5400)]
    pub sweep_interval: u64,

    /// Maximum capacity in MiB (default: 128 MiB)
    #[config(env = "AUTHN_CACHE_CAPACITY", default = 128)]
    pub capacity: usize,
}

impl CacheConfig {
    pub fn store(&self) -> Result<CacheStore, String> {
        self.store.parse()
    }

    pub fn identity_ttl(&self) -> Duration {
        Duration::from_secs(self.identity_ttl)
    }

    pub fn membership_ttl(&self) -> Duration {
        Duration::from_secs(self.membership_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}
