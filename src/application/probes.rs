//! Health, readiness, metrics and cache administration.
//!
//! Only the store decides health. Host metrics and the cache are reported
//! when they can be read and annotated when they cannot.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::host::{HostMetrics, HostMetricsProbe, ProbeUnavailable};
use crate::application::repos::{PostsRepo, RepoError, StoreHealth, UsersRepo};
use crate::cache::{CacheBackend, CacheError, CacheStats};

pub const METRIC_POSTS_TOTAL: &str = "microblog_posts_total";
pub const METRIC_USERS_TOTAL: &str = "microblog_users_total";
pub const METRIC_MEMORY_PERCENT: &str = "microblog_memory_usage_percent";
pub const METRIC_CPU_PERCENT: &str = "microblog_cpu_usage_percent";
pub const METRIC_HOST_AVAILABLE: &str = "microblog_host_metrics_available";
pub const METRIC_SYSTEM_ERROR: &str = "microblog_system_metrics_error";
pub const METRIC_STORE_UP: &str = "microblog_store_up";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub version: String,
    pub checks: HealthChecks,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<DiskCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryCheck {
    pub usage_percent: f64,
    pub available_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiskCheck {
    pub usage_percent: f64,
    pub free_gb: f64,
}

#[derive(Clone)]
pub struct ProbeService {
    store: Arc<dyn StoreHealth>,
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    cache: Arc<dyn CacheBackend>,
    host: Arc<dyn HostMetricsProbe>,
    version: String,
}

impl ProbeService {
    pub fn new(
        store: Arc<dyn StoreHealth>,
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
        cache: Arc<dyn CacheBackend>,
        host: Arc<dyn HostMetricsProbe>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            posts,
            users,
            cache,
            host,
            version: version.into(),
        }
    }

    pub async fn health(&self) -> HealthReport {
        let (status, database) = match self.store.ping().await {
            Ok(()) => (HealthStatus::Healthy, "healthy".to_string()),
            Err(err) => {
                warn!(error = %err, "Health check: store ping failed");
                (HealthStatus::Unhealthy, format!("unhealthy: {err}"))
            }
        };

        let mut checks = HealthChecks {
            database,
            memory: None,
            disk: None,
            system: None,
        };
        match self.host.try_read().await {
            Ok(host) => {
                checks.memory = Some(MemoryCheck {
                    usage_percent: round2(host.memory_usage_percent),
                    available_mb: round2(host.memory_available_bytes as f64 / BYTES_PER_MB),
                });
                checks.disk = Some(DiskCheck {
                    usage_percent: round2(host.disk_usage_percent),
                    free_gb: round2(host.disk_free_bytes as f64 / BYTES_PER_GB),
                });
            }
            Err(ProbeUnavailable::NotSupported) => {
                checks.system =
                    Some("host metrics not available (basic health check only)".to_string());
            }
            Err(ProbeUnavailable::Failed(reason)) => {
                checks.system = Some(format!("host metrics error: {reason}"));
            }
        }

        HealthReport {
            status,
            timestamp: OffsetDateTime::now_utc(),
            version: self.version.clone(),
            checks,
        }
    }

    pub async fn readiness(&self) -> Result<(), RepoError> {
        self.store.ping().await
    }

    /// Plain-text exposition, one `name value` pair per line.
    pub async fn metrics_text(&self) -> Result<String, RepoError> {
        let posts = self.posts.count_posts().await?;
        let users = self.users.count_users().await?;

        let mut lines = vec![
            format!("{METRIC_POSTS_TOTAL} {posts}"),
            format!("{METRIC_USERS_TOTAL} {users}"),
        ];
        match self.host.try_read().await {
            Ok(HostMetrics {
                memory_usage_percent,
                cpu_usage_percent,
                ..
            }) => {
                lines.push(format!("{METRIC_MEMORY_PERCENT} {}", round2(memory_usage_percent)));
                lines.push(format!("{METRIC_CPU_PERCENT} {}", round2(cpu_usage_percent)));
            }
            Err(ProbeUnavailable::NotSupported) => {
                lines.push(format!("{METRIC_HOST_AVAILABLE} 0"));
            }
            Err(ProbeUnavailable::Failed(reason)) => {
                warn!(%reason, "Metrics: host metrics read failed");
                lines.push(format!("{METRIC_SYSTEM_ERROR} 1"));
            }
        }

        let mut text = String::new();
        for line in lines {
            let _ = writeln!(text, "{line}");
        }
        Ok(text)
    }

    pub async fn cache_info(&self) -> Result<CacheStats, CacheError> {
        self.cache.stats().await
    }

    pub async fn cache_clear(&self) -> Result<(), CacheError> {
        self.cache.clear().await
    }
}

/// Text served by `/metrics` when the store cannot be counted.
pub fn store_down_metrics() -> String {
    format!("{METRIC_STORE_UP} 0\n")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(50.0), 50.0);
    }

    #[test]
    fn healthy_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(HealthStatus::Unhealthy).expect("serialize"),
            "unhealthy"
        );
    }
}
