//! Snapshot assembler: gathers every metric family concurrently and builds one
//! owned `Snapshot` per call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, warn};

use super::{readers_for, ReaderContext, SourceReaderSet};
use crate::config::CollectorConfig;
use crate::error::{SourceError, SourceResult};
use crate::model::*;
use crate::platform::{self, PlatformFamily};
use crate::rates::{CounterStore, RateCalculator};
use crate::services::Catalog;

pub struct Collector {
    readers: Box<dyn SourceReaderSet>,
    rates: RateCalculator,
    catalog: Arc<Catalog>,
    collect_timeout: Duration,
}

impl Collector {
    pub fn new(
        readers: Box<dyn SourceReaderSet>,
        counters: Arc<dyn CounterStore>,
        catalog: Arc<Catalog>,
        collect_timeout: Duration,
    ) -> Self {
        Self {
            readers,
            rates: RateCalculator::new(counters),
            catalog,
            collect_timeout,
        }
    }

    /// A collector for the running host with real readers.
    pub fn for_host(config: &CollectorConfig, counters: Arc<dyn CounterStore>) -> Result<Self> {
        let catalog = Catalog::load(config.catalog_path.as_deref())?;
        let family = platform::detect();
        debug!(%family, "selected source readers");
        let readers = readers_for(family, ReaderContext::host(config.command_timeout()));
        Ok(Self::new(
            readers,
            counters,
            Arc::new(catalog),
            config.collect_timeout(),
        ))
    }

    pub fn family(&self) -> PlatformFamily {
        self.readers.family()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Collect a complete snapshot of this host. Never fails: every source
    /// that cannot be read leaves its field at the default.
    pub async fn collect(&self) -> Snapshot {
        self.collect_with(None).await
    }

    /// As [`collect`](Self::collect), with an explicit interval in seconds for
    /// network rates instead of the time since the stored sample.
    pub async fn collect_with(&self, elapsed_override: Option<f64>) -> Snapshot {
        let family = self.family();

        let (os, cpu, memory, disks, network, uptime, services) = tokio::join!(
            self.bounded("os", self.readers.os_info()),
            self.bounded("cpu", self.readers.cpu_info()),
            self.bounded("memory", self.readers.memory_info()),
            self.bounded("disks", self.readers.disks()),
            self.bounded("network", self.network(elapsed_override)),
            self.bounded("uptime", self.readers.uptime_secs()),
            self.services(),
        );

        let network = network.unwrap_or_else(|e| {
            warn!(error = %e, "failed to collect network interfaces");
            Vec::new()
        });
        let server_address = network
            .iter()
            .map(|iface| iface.ip_address.as_str())
            .find(|ip| *ip != UNKNOWN)
            .map(str::to_string);

        Snapshot {
            collected_at: Utc::now(),
            collector_version: env!("CARGO_PKG_VERSION").to_string(),
            hostname: hostname(),
            server_address,
            uptime_secs: uptime.unwrap_or_else(|e| {
                warn!(error = %e, "failed to collect uptime");
                0
            }),
            os: os.unwrap_or_else(|e| {
                warn!(error = %e, "failed to collect OS info");
                OsInfo::generic(family)
            }),
            cpu: cpu.unwrap_or_else(|e| {
                warn!(error = %e, "failed to collect CPU info");
                CpuInfo::default()
            }),
            memory: memory.unwrap_or_else(|e| {
                warn!(error = %e, "failed to collect memory info");
                MemoryInfo::default()
            }),
            disks: disks.unwrap_or_else(|e| {
                warn!(error = %e, "failed to collect disk info");
                Vec::new()
            }),
            network,
            services,
        }
    }

    /// Discover running services only. Network baselines are left untouched.
    pub async fn services(&self) -> Vec<Service> {
        self.bounded("services", self.readers.services(&self.catalog))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to discover services");
                Vec::new()
            })
    }

    async fn network(&self, elapsed_override: Option<f64>) -> SourceResult<Vec<NetworkInterface>> {
        let readings = self.readers.interfaces().await?;
        Ok(self
            .rates
            .annotate(readings, Utc::now(), elapsed_override)
            .await)
    }

    async fn bounded<T>(
        &self,
        what: &str,
        fut: impl Future<Output = SourceResult<T>>,
    ) -> SourceResult<T> {
        tokio::time::timeout(self.collect_timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(SourceError::Timeout {
                    source_name: what.to_string(),
                    timeout: self.collect_timeout,
                })
            })
    }
}

fn hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| UNKNOWN.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::linux;
    use crate::mock::{MockExecutor, MockFs};
    use crate::rates::MemoryCounterStore;

    fn collector(fs: MockFs, exec: MockExecutor, family: PlatformFamily) -> Collector {
        let ctx = ReaderContext::new(Arc::new(fs), Arc::new(exec), Duration::from_millis(200));
        Collector::new(
            readers_for(family, ctx),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(Catalog::builtin().unwrap()),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn full_linux_snapshot() {
        let (fs, exec) = linux::fixture();
        let snap = collector(fs, exec, PlatformFamily::Linux).collect().await;

        assert_eq!(snap.os.distribution_name, "Ubuntu 22.04.4 LTS");
        assert_eq!(snap.cpu.core_count, 4);
        assert_eq!(snap.memory.total_bytes, 8_000_000 * 1024);
        assert_eq!(snap.memory.usage_percent, 50);
        assert_eq!(snap.disks.len(), 2);
        assert_eq!(snap.network.len(), 1);
        assert_eq!(snap.server_address.as_deref(), Some("10.1.2.3"));
        assert_eq!(snap.uptime_secs, 3725);
        assert_eq!(snap.services.len(), 2);
        assert_eq!(snap.collector_version, env!("CARGO_PKG_VERSION"));
        assert!(!snap.hostname.is_empty());
    }

    #[tokio::test]
    async fn missing_meminfo_degrades_only_memory() {
        let (mut fs, exec) = linux::fixture();
        fs.remove_file("/proc/meminfo");
        let snap = collector(fs, exec, PlatformFamily::Linux).collect().await;

        assert_eq!(snap.memory, MemoryInfo::default());
        assert_eq!(snap.cpu.core_count, 4);
        assert_eq!(snap.disks.len(), 2);
        assert_eq!(snap.network.len(), 1);
        assert_eq!(snap.os.icon_hint, "fa-ubuntu");
    }

    #[tokio::test]
    async fn consecutive_collections_are_stable_and_gain_rates() {
        let (fs, exec) = linux::fixture();
        let c = collector(fs, exec, PlatformFamily::Linux);

        let first = c.collect().await;
        let second = c.collect_with(Some(5.0)).await;

        assert_eq!(first.network[0].rx_rate_bytes_per_sec, None);
        assert_eq!(second.network[0].rx_rate_bytes_per_sec, Some(0.0));
        assert_eq!(first.cpu, second.cpu);
        assert_eq!(first.memory, second.memory);
        assert_eq!(first.disks, second.disks);
        assert_eq!(first.services, second.services);
    }

    #[tokio::test]
    async fn service_discovery_leaves_rate_baseline_alone() {
        let (fs, exec) = linux::fixture();
        let c = collector(fs, exec, PlatformFamily::Linux);

        let services = c.services().await;
        assert_eq!(services.len(), 2);

        let first = c.collect().await;
        assert_eq!(first.network[0].rx_rate_bytes_per_sec, None);
        assert_eq!(first.services, services);
    }

    #[tokio::test]
    async fn hanging_source_is_bounded_by_collect_timeout() {
        let (fs, _) = linux::fixture();
        let exec = MockExecutor::new().with_hang("ps aux");
        let ctx = ReaderContext::new(Arc::new(fs), Arc::new(exec), Duration::from_secs(30));
        let c = Collector::new(
            readers_for(PlatformFamily::Linux, ctx),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(Catalog::builtin().unwrap()),
            Duration::from_millis(100),
        );

        let snap = c.collect().await;
        assert!(snap.services.is_empty());
        assert_eq!(snap.cpu.core_count, 4);
    }

    #[tokio::test]
    async fn unknown_platform_is_minimal_not_failing() {
        let snap = collector(MockFs::new(), MockExecutor::new(), PlatformFamily::Unknown)
            .collect()
            .await;
        assert_eq!(snap.os.family, PlatformFamily::Unknown);
        assert_eq!(snap.os.distribution_name, "Unknown system");
        assert!(snap.disks.is_empty());
        assert!(snap.network.is_empty());
        assert_eq!(snap.server_address, None);
    }

    #[tokio::test]
    async fn percentages_stay_in_range() {
        let (mut fs, exec) = linux::fixture();
        fs.add_file("/proc/loadavg", "64.00 32.00 16.00 1/1 1\n");
        let snap = collector(fs, exec, PlatformFamily::Linux).collect().await;
        assert_eq!(snap.cpu.usage_percent, 100);
        assert!(snap.memory.usage_percent <= 100);
    }
}
