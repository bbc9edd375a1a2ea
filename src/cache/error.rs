use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cache operation `{op}` timed out after {timeout_ms}ms")]
    Timeout { op: &'static str, timeout_ms: u128 },
    #[error("value stored under `{key}` is not a counter")]
    NotACounter { key: String },
}
