//! Redis cache backend.
//!
//! The connection is established lazily and re-attempted on the next call
//! after a failure, so an unreachable Redis at boot never blocks startup.
//! Every round trip is bounded by the configured response timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{InfoDict, RedisResult};
use tokio::sync::OnceCell;
use tracing::info;

use super::backend::{CacheBackend, CacheStats};
use super::config::CacheConfig;
use super::error::CacheError;

/// Keys requested per `SCAN` step when clearing the prefix.
const SCAN_BATCH: usize = 500;

pub struct RedisCache {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
    key_prefix: String,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl RedisCache {
    pub fn new(url: &str, config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            manager: OnceCell::new(),
            key_prefix: config.key_prefix.clone(),
            connect_timeout: config.connect_timeout,
            response_timeout: config.response_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_connection_timeout(self.connect_timeout)
                    .set_response_timeout(self.response_timeout)
                    .set_number_of_retries(1);
                let connect = ConnectionManager::new_with_config(self.client.clone(), config);
                let manager = match tokio::time::timeout(self.connect_timeout, connect).await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(CacheError::Timeout {
                            op: "connect",
                            timeout_ms: self.connect_timeout.as_millis(),
                        });
                    }
                };
                info!(
                    target = "microblog::cache::redis",
                    "Connected to redis cache"
                );
                Ok(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.response_timeout, call).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout {
                op,
                timeout_ms: self.response_timeout.as_millis(),
            }),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = self
            .bounded("get", redis::cmd("GET").arg(key).query_async(&mut conn))
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl.as_millis().max(1) as u64);
        }
        let _: () = self.bounded("set", cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = self
            .bounded("delete", redis::cmd("DEL").arg(key).query_async(&mut conn))
            .await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<u64, CacheError> {
        let mut conn = self.connection().await?;
        let value: u64 = self
            .bounded("incr", redis::cmd("INCR").arg(key).query_async(&mut conn))
            .await?;
        Ok(value)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        if self.key_prefix.is_empty() {
            let _: () = self
                .bounded("clear", redis::cmd("FLUSHDB").query_async(&mut conn))
                .await?;
            return Ok(());
        }

        let pattern = format!("{}*", self.key_prefix);
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = self
                .bounded(
                    "clear",
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn),
                )
                .await?;
            if !keys.is_empty() {
                let _: () = self
                    .bounded("clear", redis::cmd("UNLINK").arg(&keys).query_async(&mut conn))
                    .await?;
            }
            if next == 0 {
                return Ok(());
            }
            cursor = next;
        }
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut conn = self.connection().await?;
        let info: InfoDict = self
            .bounded("stats", redis::cmd("INFO").query_async(&mut conn))
            .await?;

        Ok(CacheStats::new(
            "Redis",
            info.get("connected_clients"),
            info.get("used_memory_human"),
            info.get("keyspace_hits"),
            info.get("keyspace_misses"),
        ))
    }
}
