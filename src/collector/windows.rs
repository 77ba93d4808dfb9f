//! Windows readers: `wmic`, the processor-time performance counter and
//! `sc query`.
//!
//! No network interface source is read on Windows; the list stays empty.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::parse;
use super::{ReaderContext, SourceReaderSet};
use crate::error::{SourceError, SourceResult};
use crate::model::{CpuInfo, DiskInfo, MemoryInfo, OsInfo, Service};
use crate::platform::PlatformFamily;
use crate::services::{self, Catalog};

const PROCESSOR_TIME: &str =
    "(Get-Counter '\\Processor(_Total)\\% Processor Time').CounterSamples.CookedValue";

pub struct WindowsReaders {
    ctx: ReaderContext,
}

impl WindowsReaders {
    pub fn new(ctx: ReaderContext) -> Self {
        Self { ctx }
    }

    async fn wmic(&self, args: &[&str]) -> SourceResult<String> {
        self.ctx.run("wmic", args).await
    }
}

fn field_u64(
    values: &std::collections::HashMap<String, String>,
    key: &str,
    source: &str,
) -> SourceResult<u64> {
    values
        .get(key)
        .ok_or_else(|| SourceError::parse(source, format!("{} missing", key)))?
        .parse()
        .map_err(|e| SourceError::parse(source, e))
}

#[async_trait]
impl SourceReaderSet for WindowsReaders {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::Windows
    }

    async fn os_info(&self) -> SourceResult<OsInfo> {
        let mut os = OsInfo::generic(PlatformFamily::Windows);
        match self.wmic(&["os", "get", "Caption,Version", "/value"]).await {
            Ok(out) => {
                let values = parse::parse_wmic_values(&out);
                if let Some(caption) = values.get("Caption") {
                    os.distribution_name = caption.clone();
                }
                if let Some(version) = values.get("Version") {
                    os.kernel_version = version.clone();
                }
            }
            Err(e) => debug!(error = %e, "wmic os query failed"),
        }
        Ok(os)
    }

    async fn cpu_info(&self) -> SourceResult<CpuInfo> {
        let (cpu_out, usage_out) = tokio::join!(
            self.wmic(&[
                "cpu",
                "get",
                "Name,NumberOfCores,NumberOfLogicalProcessors",
                "/value",
            ]),
            self.ctx
                .run("powershell", &["-NoProfile", "-Command", PROCESSOR_TIME]),
        );

        let mut cpu = CpuInfo::default();
        if let Ok(out) = cpu_out {
            // One record per socket.
            let sockets = parse::parse_wmic_records(&out);
            if let Some(name) = sockets.first().and_then(|s| s.get("Name")) {
                cpu.model_name = name.clone();
            }
            let sum = |key: &str| -> u32 {
                sockets
                    .iter()
                    .filter_map(|s| s.get(key).and_then(|v| v.parse::<u32>().ok()))
                    .sum()
            };
            cpu.core_count = sum("NumberOfCores").max(1);
            cpu.thread_count = match sum("NumberOfLogicalProcessors") {
                0 => cpu.core_count,
                n => n,
            };
        }

        // An unreadable counter is a valid "unknown" reading of 0.
        cpu.usage_percent = usage_out
            .ok()
            .and_then(|out| parse::parse_counter_percent(&out))
            .unwrap_or(0);

        Ok(cpu)
    }

    async fn memory_info(&self) -> SourceResult<MemoryInfo> {
        const SOURCE: &str = "wmic OS";
        let out = self
            .wmic(&[
                "OS",
                "get",
                "TotalVisibleMemorySize,FreePhysicalMemory",
                "/value",
            ])
            .await?;
        let values = parse::parse_wmic_values(&out);
        let bytes = |key: &str| -> SourceResult<u64> {
            parse::kb_to_bytes(field_u64(&values, key, SOURCE)?)
                .ok_or_else(|| SourceError::parse(SOURCE, format!("{} out of range", key)))
        };
        let total = bytes("TotalVisibleMemorySize")?;
        let free = bytes("FreePhysicalMemory")?;
        Ok(parse::memory_from_total_free(total, free))
    }

    async fn disks(&self) -> SourceResult<Vec<DiskInfo>> {
        let out = self
            .wmic(&["logicaldisk", "get", "Caption,FreeSpace,Size", "/value"])
            .await?;

        // Drives without media report no Size or FreeSpace and are skipped.
        Ok(parse::parse_wmic_records(&out)
            .iter()
            .filter_map(|drive| {
                let caption = drive.get("Caption")?;
                let size = drive.get("Size")?.parse().ok()?;
                let free = drive.get("FreeSpace")?.parse().ok()?;
                Some(DiskInfo::new(caption.clone(), size, free))
            })
            .collect())
    }

    async fn uptime_secs(&self) -> SourceResult<u64> {
        let out = self
            .wmic(&["os", "get", "LastBootUpTime", "/value"])
            .await?;
        let values = parse::parse_wmic_values(&out);
        let boot = values
            .get("LastBootUpTime")
            .and_then(|v| parse::parse_cim_datetime(v))
            .ok_or_else(|| SourceError::parse("wmic os LastBootUpTime", "no timestamp"))?;
        Ok(parse::uptime_since(boot, Utc::now()))
    }

    async fn services(&self, catalog: &Catalog) -> SourceResult<Vec<Service>> {
        services::discover_windows(&self.ctx, catalog).await
    }
}
