//! Microblog cache.
//!
//! A string-keyed store with per-key expiry sits behind [`CacheBackend`];
//! [`PostCache`] layers the post read-through and invalidation policy on
//! top of it.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"            # or "memory"
//! redis_url = "redis://127.0.0.1:6379/0"
//! key_prefix = "microblog:"
//! list_ttl_seconds = 60
//! item_ttl_seconds = 300
//! connect_timeout_ms = 5000
//! response_timeout_ms = 5000
//! ```

mod backend;
mod config;
mod error;
mod keys;
pub mod memory;
mod posts;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

pub use backend::{CacheBackend, CacheStats, hit_rate_percent, human_bytes};
pub use config::{CacheBackendKind, CacheConfig};
pub use error::CacheError;
pub use keys::CacheKeys;
pub use memory::MemoryCache;
pub use posts::{
    METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATION, METRIC_CACHE_MISS, PostCache,
};
pub use self::redis::RedisCache;

const SELF_CHECK_TTL: Duration = Duration::from_secs(10);
const SELF_CHECK_VALUE: &str = "ok";

/// Construct the configured backend. Redis connects lazily on first use.
pub fn build_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    let backend: Arc<dyn CacheBackend> = match &config.backend {
        CacheBackendKind::Memory => Arc::new(MemoryCache::new(config)),
        CacheBackendKind::Redis { url } => Arc::new(RedisCache::new(url, config)?),
    };
    Ok(backend)
}

/// Write and read back a short-lived key. The outcome is logged and returned;
/// callers decide whether it matters.
pub async fn self_check(backend: &dyn CacheBackend, keys: &CacheKeys, backend_name: &str) -> bool {
    let key = keys.self_check();
    let outcome = match backend
        .set(&key, SELF_CHECK_VALUE.to_string(), Some(SELF_CHECK_TTL))
        .await
    {
        Ok(()) => backend.get(&key).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(Some(value)) if value == SELF_CHECK_VALUE => {
            info!(backend = backend_name, "Cache self-check passed");
            true
        }
        Ok(_) => {
            error!(
                backend = backend_name,
                "Cache self-check failed: test key did not round-trip"
            );
            false
        }
        Err(err) => {
            error!(backend = backend_name, error = %err, "Cache self-check failed");
            false
        }
    }
}
