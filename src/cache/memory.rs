//! In-process cache backend.
//!
//! LRU-bounded map with per-entry expiry. Expired entries are dropped lazily
//! on access and are never returned.

use std::sync::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::time::Instant;
use tracing::warn;

use super::backend::{CacheBackend, CacheStats, human_bytes};
use super::config::CacheConfig;
use super::error::CacheError;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

pub struct MemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_capacity_non_zero())),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.locked("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the map, recovering from poisoning.
    fn locked(&self, op: &'static str) -> MutexGuard<'_, LruCache<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!(op, "Recovered poisoned memory cache lock");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.locked("get");
        let lookup = entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));
        let found = match lookup {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        };
        drop(entries);

        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.locked("set").put(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.locked("delete").pop(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = self.locked("incr");
        let (current, expires_at) = match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let current = entry
                    .value
                    .parse::<u64>()
                    .map_err(|_| CacheError::NotACounter {
                        key: key.to_string(),
                    })?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };
        let next = current + 1;
        entries.put(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.locked("clear").clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let used_bytes: usize = self
            .locked("stats")
            .iter()
            .map(|(key, entry)| key.len() + entry.value.len())
            .sum();

        Ok(CacheStats::new(
            "Memory",
            None,
            Some(human_bytes(used_bytes as u64)),
            Some(self.hits.load(Ordering::Relaxed)),
            Some(self.misses.load(Ordering::Relaxed)),
        ))
    }
}
