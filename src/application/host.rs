//! Host resource readings used by the health and metrics probes.

use async_trait::async_trait;
use thiserror::Error;

/// One snapshot of host resource usage.
#[derive(Debug, Clone, PartialEq)]
pub struct HostMetrics {
    pub memory_usage_percent: f64,
    pub memory_available_bytes: u64,
    pub cpu_usage_percent: f64,
    pub disk_usage_percent: f64,
    pub disk_free_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeUnavailable {
    /// No probe is compiled in or the platform cannot be read.
    #[error("host metrics not supported on this build")]
    NotSupported,
    #[error("host metrics read failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait HostMetricsProbe: Send + Sync {
    async fn try_read(&self) -> Result<HostMetrics, ProbeUnavailable>;
}

/// Probe for builds without host metrics support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHostMetrics;

#[async_trait]
impl HostMetricsProbe for NoHostMetrics {
    async fn try_read(&self) -> Result<HostMetrics, ProbeUnavailable> {
        Err(ProbeUnavailable::NotSupported)
    }
}
