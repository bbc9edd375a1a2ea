//! The key-value contract every cache store implements.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use super::error::CacheError;

/// String-keyed cache with optional per-key expiry.
///
/// Values are opaque serialized payloads. Implementations must never return
/// an entry whose expiry has passed.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value`, replacing any existing entry and its expiry. `None`
    /// keeps the entry until it is deleted, cleared, or evicted.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically increment the integer stored under `key`, treating a
    /// missing entry as zero. Returns the new value.
    async fn incr(&self, key: &str) -> Result<u64, CacheError>;

    /// Drop every entry owned by this application.
    async fn clear(&self) -> Result<(), CacheError>;

    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

/// Best-effort backend statistics. Fields the backend cannot report
/// serialize as `"unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub cache_type: &'static str,
    #[serde(serialize_with = "unknown_if_none")]
    pub connected_clients: Option<u64>,
    #[serde(serialize_with = "unknown_if_none")]
    pub used_memory_human: Option<String>,
    #[serde(serialize_with = "unknown_if_none")]
    pub keyspace_hits: Option<u64>,
    #[serde(serialize_with = "unknown_if_none")]
    pub keyspace_misses: Option<u64>,
    pub hit_rate: f64,
}

impl CacheStats {
    pub fn new(
        cache_type: &'static str,
        connected_clients: Option<u64>,
        used_memory_human: Option<String>,
        keyspace_hits: Option<u64>,
        keyspace_misses: Option<u64>,
    ) -> Self {
        let hit_rate = hit_rate_percent(keyspace_hits.unwrap_or(0), keyspace_misses.unwrap_or(0));
        Self {
            cache_type,
            connected_clients,
            used_memory_human,
            keyspace_hits,
            keyspace_misses,
            hit_rate,
        }
    }
}

/// Hit percentage rounded to two decimals; zero lookups yield `0.0`.
pub fn hit_rate_percent(hits: u64, misses: u64) -> f64 {
    let lookups = (hits + misses).max(1) as f64;
    let percent = hits as f64 / lookups * 100.0;
    (percent * 100.0).round() / 100.0
}

/// Render a byte count the way Redis reports `used_memory_human`.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];
    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.2}{unit}")
}

fn unknown_if_none<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_str("unknown"),
    }
}
