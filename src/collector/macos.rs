//! macOS readers: sysctl, sw_vers, vm_stat, mount, ifconfig, netstat.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::parse;
use super::{InterfaceReading, ReaderContext, SourceReaderSet};
use crate::error::{SourceError, SourceResult};
use crate::model::{CpuInfo, DiskInfo, LinkStatus, MemoryInfo, OsInfo, Service, UNKNOWN};
use crate::platform::PlatformFamily;
use crate::services::{self, Catalog};

pub struct MacOsReaders {
    ctx: ReaderContext,
}

impl MacOsReaders {
    pub fn new(ctx: ReaderContext) -> Self {
        Self { ctx }
    }

    async fn sysctl(&self, key: &str) -> SourceResult<String> {
        self.ctx.run("sysctl", &["-n", key]).await
    }

    async fn sysctl_u64(&self, key: &str) -> SourceResult<u64> {
        let value = self.sysctl(key).await?;
        value
            .trim()
            .parse()
            .map_err(|e| SourceError::parse(format!("sysctl {}", key), e))
    }
}

#[async_trait]
impl SourceReaderSet for MacOsReaders {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::MacOs
    }

    async fn os_info(&self) -> SourceResult<OsInfo> {
        let mut os = OsInfo::generic(PlatformFamily::MacOs);

        let (name, version, kernel, arch) = tokio::join!(
            self.ctx.run("sw_vers", &["-productName"]),
            self.ctx.run("sw_vers", &["-productVersion"]),
            self.ctx.run("uname", &["-r"]),
            self.ctx.run("uname", &["-m"]),
        );

        let name = name.unwrap_or_else(|_| PlatformFamily::MacOs.label().to_string());
        if let Ok(version) = version {
            os.distribution_name = format!("{} {}", name, version);
        } else {
            os.distribution_name = name;
        }
        os.kernel_version = kernel.unwrap_or_else(|_| UNKNOWN.into());
        if let Ok(arch) = arch {
            os.architecture = arch;
        }

        Ok(os)
    }

    async fn cpu_info(&self) -> SourceResult<CpuInfo> {
        let (model, physical, logical, load) = tokio::join!(
            self.sysctl("machdep.cpu.brand_string"),
            self.sysctl_u64("hw.physicalcpu"),
            self.sysctl_u64("hw.logicalcpu"),
            self.sysctl("vm.loadavg"),
        );

        let mut cpu = CpuInfo::default();
        if let Ok(model) = model {
            cpu.model_name = model;
        }
        cpu.core_count = physical
            .ok()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(1)
            .max(1);
        cpu.thread_count = logical
            .ok()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(cpu.core_count)
            .max(1);

        match load.map(|out| parse::parse_braced_loadavg(&out)) {
            Ok(Some(load)) => {
                cpu.usage_percent = parse::load_usage_percent(load.one, cpu.core_count);
                cpu.load_average = Some(load);
            }
            Ok(None) => debug!("vm.loadavg not parseable"),
            Err(e) => debug!(error = %e, "load average unavailable"),
        }

        Ok(cpu)
    }

    async fn memory_info(&self) -> SourceResult<MemoryInfo> {
        let total = self.sysctl_u64("hw.memsize").await?;
        let vm_stat = self.ctx.run("vm_stat", &[]).await?;

        let page_size = parse::parse_vm_stat_page_size(&vm_stat).unwrap_or(4096);
        let free_pages = parse::parse_vm_stat_field(&vm_stat, "Pages free")
            .saturating_add(parse::parse_vm_stat_field(&vm_stat, "Pages inactive"))
            .saturating_add(parse::parse_vm_stat_field(&vm_stat, "Pages speculative"));

        Ok(parse::memory_from_total_free(
            total,
            free_pages.saturating_mul(page_size),
        ))
    }

    async fn disks(&self) -> SourceResult<Vec<DiskInfo>> {
        let mounts = match self.ctx.run("mount", &[]).await {
            Ok(out) => parse::parse_bsd_mount(&out),
            Err(e) => {
                debug!(error = %e, "mount table unavailable, reporting / only");
                vec!["/".to_string()]
            }
        };

        Ok(mounts
            .iter()
            .filter_map(|mp| {
                self.ctx
                    .disk(mp)
                    .map_err(|e| debug!(mount = %mp, error = %e, "skipping mount"))
                    .ok()
            })
            .collect())
    }

    async fn interfaces(&self) -> SourceResult<Vec<InterfaceReading>> {
        let (ifconfig, netstat) = tokio::join!(
            self.ctx.run("ifconfig", &[]),
            self.ctx.run("netstat", &["-ib"]),
        );
        let entries = parse::parse_ifconfig(&ifconfig?);
        let counters = netstat
            .map(|out| parse::parse_netstat_ib(&out))
            .unwrap_or_default();

        Ok(entries
            .into_iter()
            .filter(|e| !parse::is_loopback(&e.name))
            .map(|e| InterfaceReading {
                counters: counters.get(&e.name).copied(),
                ip_address: e.ipv4.unwrap_or_else(|| UNKNOWN.into()),
                mac_address: e.mac.unwrap_or_else(|| UNKNOWN.into()),
                link_status: if e.up { LinkStatus::Up } else { LinkStatus::Down },
                name: e.name,
            })
            .collect())
    }

    async fn uptime_secs(&self) -> SourceResult<u64> {
        let out = self.sysctl("kern.boottime").await?;
        let boot = parse::parse_kern_boottime(&out)
            .ok_or_else(|| SourceError::parse("sysctl kern.boottime", "no sec field"))?;
        Ok(parse::uptime_since(boot, Utc::now()))
    }

    async fn services(&self, catalog: &Catalog) -> SourceResult<Vec<Service>> {
        services::discover_unix(&self.ctx, catalog, false).await
    }
}
