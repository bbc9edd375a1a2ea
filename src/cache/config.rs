//! Cache configuration.
//!
//! Resolved from the `[cache]` section of `microblog.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

// Default values for cache configuration
const DEFAULT_KEY_PREFIX: &str = "microblog:";
const DEFAULT_LIST_TTL_SECS: u64 = 60;
const DEFAULT_ITEM_TTL_SECS: u64 = 300;
const DEFAULT_MEMORY_CAPACITY: usize = 1024;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5000;

/// Which store backs the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// In-process LRU map; entries die with the process.
    Memory,
    /// Shared Redis instance reachable at the given URL.
    Redis { url: String },
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    /// Prepended to every key this application writes.
    pub key_prefix: String,
    /// Lifetime of cached post list pages.
    pub list_ttl: Duration,
    /// Lifetime of cached single posts.
    pub item_ttl: Duration,
    /// Maximum entries held by the memory backend.
    pub memory_capacity: usize,
    /// Upper bound on establishing a Redis connection.
    pub connect_timeout: Duration,
    /// Upper bound on any single Redis round trip.
    pub response_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            list_ttl: Duration::from_secs(DEFAULT_LIST_TTL_SECS),
            item_ttl: Duration::from_secs(DEFAULT_ITEM_TTL_SECS),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend.clone(),
            key_prefix: settings.key_prefix.clone(),
            list_ttl: settings.list_ttl,
            item_ttl: settings.item_ttl,
            memory_capacity: settings.memory_capacity.get() as usize,
            connect_timeout: settings.connect_timeout,
            response_timeout: settings.response_timeout,
        }
    }
}

impl CacheConfig {
    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            CacheBackendKind::Memory => "memory",
            CacheBackendKind::Redis { .. } => "redis",
        }
    }
}
