//! Read-through helpers for post payloads.
//!
//! Cache failures never surface to callers: a failed lookup reads as a miss,
//! a failed write or invalidation is logged and counted, and a list version
//! that cannot be read disables list caching for that request.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::pagination::PageRequest;

use super::backend::CacheBackend;
use super::config::CacheConfig;
use super::error::CacheError;
use super::keys::CacheKeys;

pub const METRIC_CACHE_HIT: &str = "microblog_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "microblog_cache_miss_total";
pub const METRIC_CACHE_ERROR: &str = "microblog_cache_error_total";
pub const METRIC_CACHE_INVALIDATION: &str = "microblog_cache_invalidation_total";

/// Generations below this value are never used to key list pages.
const GENERATION_FLOOR: u64 = 1 << 32;
const GENERATION_CEILING: u64 = 1 << 62;

const OP_ITEM: &str = "post_item";
const OP_LIST: &str = "post_list";

#[derive(Clone)]
pub struct PostCache {
    backend: Arc<dyn CacheBackend>,
    keys: CacheKeys,
    list_ttl: Duration,
    item_ttl: Duration,
}

impl PostCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            backend,
            keys: CacheKeys::new(config.key_prefix.clone()),
            list_ttl: config.list_ttl,
            item_ttl: config.item_ttl,
        }
    }

    /// Current list generation; `None` means lists must bypass the cache.
    ///
    /// A counter that is missing (never written, evicted or cleared) or below
    /// `GENERATION_FLOOR` is replaced with a fresh random generation, so a
    /// generation number is never handed out twice.
    pub async fn list_version(&self) -> Option<u64> {
        let key = self.keys.post_list_version();
        match self.backend.get(&key).await {
            Ok(None) => self.reseed_lists(&key).await,
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(version) if version >= GENERATION_FLOOR => Some(version),
                Ok(_) => self.reseed_lists(&key).await,
                Err(_) => {
                    self.degraded("version", &key, &CacheError::NotACounter { key: key.clone() });
                    None
                }
            },
            Err(err) => {
                self.degraded("version", &key, &err);
                None
            }
        }
    }

    pub async fn get_list(&self, version: u64, page: PageRequest) -> Option<Value> {
        let key = self.keys.post_list(version, page);
        self.lookup(OP_LIST, &key).await
    }

    pub async fn put_list(&self, version: u64, page: PageRequest, payload: &Value) {
        let key = self.keys.post_list(version, page);
        self.store(&key, payload, self.list_ttl).await;
    }

    pub async fn get_item(&self, id: i64) -> Option<Value> {
        let key = self.keys.post_item(id);
        self.lookup(OP_ITEM, &key).await
    }

    pub async fn put_item(&self, id: i64, payload: &Value) {
        let key = self.keys.post_item(id);
        self.store(&key, payload, self.item_ttl).await;
    }

    /// Orphan every cached list page by bumping the list generation.
    ///
    /// `incr` on a vanished counter restarts it at 1; such a result is
    /// replaced with a fresh generation.
    pub async fn invalidate_lists(&self) {
        let key = self.keys.post_list_version();
        match self.backend.incr(&key).await {
            Ok(version) => {
                if version < GENERATION_FLOOR {
                    self.reseed_lists(&key).await;
                }
                counter!(METRIC_CACHE_INVALIDATION, "target" => OP_LIST).increment(1);
            }
            Err(err) => self.degraded("incr", &key, &err),
        }
    }

    pub async fn invalidate_item(&self, id: i64) {
        let key = self.keys.post_item(id);
        match self.backend.delete(&key).await {
            Ok(()) => {
                counter!(METRIC_CACHE_INVALIDATION, "target" => OP_ITEM).increment(1);
            }
            Err(err) => self.degraded("delete", &key, &err),
        }
    }

    async fn reseed_lists(&self, key: &str) -> Option<u64> {
        let generation = fresh_generation();
        match self.backend.set(key, generation.to_string(), None).await {
            Ok(()) => {
                debug!(key, generation, "Seeded list generation");
                Some(generation)
            }
            Err(err) => {
                self.degraded("version", key, &err);
                None
            }
        }
    }

    async fn lookup(&self, op: &'static str, key: &str) -> Option<Value> {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "op" => op).increment(1);
                return None;
            }
            Err(err) => {
                self.degraded("get", key, &err);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "op" => op).increment(1);
                Some(value)
            }
            Err(err) => {
                warn!(op = "decode", key, error = %err, "Discarding unreadable cache entry");
                counter!(METRIC_CACHE_ERROR, "op" => "decode").increment(1);
                None
            }
        }
    }

    async fn store(&self, key: &str, payload: &Value, ttl: Duration) {
        let raw = payload.to_string();
        if let Err(err) = self.backend.set(key, raw, Some(ttl)).await {
            self.degraded("set", key, &err);
        }
    }

    fn degraded(&self, op: &'static str, key: &str, err: &CacheError) {
        warn!(op, key, error = %err, "Cache unavailable, falling back to the store");
        counter!(METRIC_CACHE_ERROR, "op" => op).increment(1);
    }
}

/// A random generation in `[GENERATION_FLOOR, GENERATION_CEILING)`; the
/// ceiling leaves room for `INCR` within a signed 64-bit counter.
fn fresh_generation() -> u64 {
    let (random, _) = Uuid::new_v4().as_u64_pair();
    GENERATION_FLOOR + random % (GENERATION_CEILING - GENERATION_FLOOR)
}
