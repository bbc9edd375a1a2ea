//! Host metrics probes.

use std::sync::Arc;

use crate::application::host::{HostMetricsProbe, NoHostMetrics};

/// The probe this build supports.
pub fn default_probe() -> Arc<dyn HostMetricsProbe> {
    #[cfg(feature = "host-metrics")]
    {
        if sysinfo::IS_SUPPORTED_SYSTEM {
            return Arc::new(sysinfo_probe::SysinfoProbe::new());
        }
    }
    Arc::new(NoHostMetrics)
}

#[cfg(feature = "host-metrics")]
pub use sysinfo_probe::SysinfoProbe;

#[cfg(feature = "host-metrics")]
mod sysinfo_probe {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use sysinfo::{Disks, System};
    use tracing::warn;

    use crate::application::host::{HostMetrics, HostMetricsProbe, ProbeUnavailable};

    /// Reads memory, CPU and root-disk usage through `sysinfo`.
    ///
    /// The `System` handle is kept between reads so CPU usage reflects the
    /// interval since the previous call.
    pub struct SysinfoProbe {
        system: Arc<Mutex<System>>,
    }

    impl SysinfoProbe {
        pub fn new() -> Self {
            let mut system = System::new();
            system.refresh_cpu_usage();
            Self {
                system: Arc::new(Mutex::new(system)),
            }
        }
    }

    impl Default for SysinfoProbe {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl HostMetricsProbe for SysinfoProbe {
        async fn try_read(&self) -> Result<HostMetrics, ProbeUnavailable> {
            let system = Arc::clone(&self.system);
            tokio::task::spawn_blocking(move || read(&system))
                .await
                .map_err(|err| ProbeUnavailable::Failed(format!("probe task failed: {err}")))?
        }
    }

    fn read(system: &Mutex<System>) -> Result<HostMetrics, ProbeUnavailable> {
        let mut system = match system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    lock_kind = "mutex",
                    result = "poisoned_recovered",
                    "Recovered from poisoned host metrics lock"
                );
                poisoned.into_inner()
            }
        };
        system.refresh_memory();
        system.refresh_cpu_usage();

        let total_memory = system.total_memory();
        if total_memory == 0 {
            return Err(ProbeUnavailable::Failed(
                "total memory reported as zero".to_string(),
            ));
        }
        let used_memory = system.used_memory();
        let memory_usage_percent = used_memory as f64 / total_memory as f64 * 100.0;
        let cpu_usage_percent = f64::from(system.global_cpu_usage());
        let memory_available_bytes = system.available_memory();
        drop(system);

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first())
            .ok_or_else(|| ProbeUnavailable::Failed("no mounted disks found".to_string()))?;
        let disk_total = disk.total_space();
        let disk_free_bytes = disk.available_space();
        let disk_usage_percent = if disk_total == 0 {
            0.0
        } else {
            (disk_total.saturating_sub(disk_free_bytes)) as f64 / disk_total as f64 * 100.0
        };

        Ok(HostMetrics {
            memory_usage_percent,
            memory_available_bytes,
            cpu_usage_percent,
            disk_usage_percent,
            disk_free_bytes,
        })
    }
}
