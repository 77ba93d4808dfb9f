//! Linux readers: /proc, /sys, /etc/os-release, `ip`, `ps`, `systemctl`.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

use super::parse;
use super::{InterfaceReading, ReaderContext, SourceReaderSet};
use crate::error::{SourceError, SourceResult};
use crate::model::{CpuInfo, DiskInfo, LinkStatus, MemoryInfo, OsInfo, Service, UNKNOWN};
use crate::platform::{distro_icon, PlatformFamily};
use crate::services::{self, Catalog};

const OS_RELEASE: &str = "/etc/os-release";
const KERNEL_RELEASE: &str = "/proc/sys/kernel/osrelease";
const CPUINFO: &str = "/proc/cpuinfo";
const LOADAVG: &str = "/proc/loadavg";
const MEMINFO: &str = "/proc/meminfo";
const MOUNTS: &str = "/proc/mounts";
const NET_DEV: &str = "/proc/net/dev";
const UPTIME: &str = "/proc/uptime";
const SYSTEMD_RUNTIME: &str = "/run/systemd/system";

pub struct LinuxReaders {
    ctx: ReaderContext,
}

impl LinuxReaders {
    pub fn new(ctx: ReaderContext) -> Self {
        Self { ctx }
    }

    async fn interface(&self, name: String, rx: u64, tx: u64) -> InterfaceReading {
        let mac_address = self
            .ctx
            .read(&format!("/sys/class/net/{}/address", name))
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN.into());

        let link_status = self
            .ctx
            .read(&format!("/sys/class/net/{}/operstate", name))
            .map(|s| parse::parse_operstate(&s))
            .unwrap_or(LinkStatus::Unknown);

        let ip_address = match self
            .ctx
            .run("ip", &["-o", "-4", "addr", "show", "dev", name.as_str()])
            .await
        {
            Ok(out) => parse::parse_ip_addr_inet(&out).unwrap_or_else(|| UNKNOWN.into()),
            Err(e) => {
                debug!(interface = %name, error = %e, "no IPv4 address");
                UNKNOWN.into()
            }
        };

        InterfaceReading {
            name,
            ip_address,
            mac_address,
            link_status,
            counters: Some((rx, tx)),
        }
    }
}

#[async_trait]
impl SourceReaderSet for LinuxReaders {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::Linux
    }

    // ── OS ─────────────────────────────────────────────────

    async fn os_info(&self) -> SourceResult<OsInfo> {
        let mut os = OsInfo::generic(PlatformFamily::Linux);

        match self.ctx.read(OS_RELEASE) {
            Ok(content) => {
                if let Some(name) = parse::parse_os_release_field(&content, "PRETTY_NAME")
                    .or_else(|| parse::parse_os_release_field(&content, "NAME"))
                {
                    os.distribution_name = name;
                }
                if let Some(id) = parse::parse_os_release_field(&content, "ID") {
                    os.icon_hint = distro_icon(&id).to_string();
                }
            }
            Err(e) => debug!(error = %e, "no os-release"),
        }

        os.kernel_version = match self.ctx.read(KERNEL_RELEASE) {
            Ok(release) => release.trim().to_string(),
            Err(_) => self
                .ctx
                .run("uname", &["-r"])
                .await
                .unwrap_or_else(|_| UNKNOWN.into()),
        };

        Ok(os)
    }

    // ── CPU ────────────────────────────────────────────────

    async fn cpu_info(&self) -> SourceResult<CpuInfo> {
        let cpuinfo = self.ctx.read(CPUINFO);
        let loadavg = self
            .ctx
            .read(LOADAVG)
            .and_then(|c| parse::parse_loadavg(&c).ok_or_else(|| SourceError::parse(LOADAVG, "expected three load figures")));

        if let (Err(e), Err(_)) = (&cpuinfo, &loadavg) {
            return Err(SourceError::unavailable(CPUINFO, e));
        }

        let mut cpu = CpuInfo::default();
        if let Ok(cpuinfo) = &cpuinfo {
            // ARM kernels label the model differently.
            cpu.model_name = parse::extract_proc_field(cpuinfo, "model name")
                .or_else(|| parse::extract_proc_field(cpuinfo, "Hardware"))
                .or_else(|| parse::extract_proc_field(cpuinfo, "Model"))
                .unwrap_or_else(|| UNKNOWN.into());
            cpu.core_count = parse::count_processors(cpuinfo).max(1);
            cpu.thread_count = cpu.core_count;
        }
        match loadavg {
            Ok(load) => {
                cpu.usage_percent = parse::load_usage_percent(load.one, cpu.core_count);
                cpu.load_average = Some(load);
            }
            Err(e) => debug!(error = %e, "load average unavailable"),
        }

        Ok(cpu)
    }

    // ── Memory ─────────────────────────────────────────────

    async fn memory_info(&self) -> SourceResult<MemoryInfo> {
        let meminfo = self.ctx.read(MEMINFO)?;
        parse::parse_meminfo(&meminfo).ok_or_else(|| SourceError::parse(MEMINFO, "MemTotal missing"))
    }

    // ── Disks ──────────────────────────────────────────────

    async fn disks(&self) -> SourceResult<Vec<DiskInfo>> {
        let mounts = match self.ctx.read(MOUNTS) {
            Ok(content) => parse::parse_proc_mounts(&content),
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

    // ── Network ────────────────────────────────────────────

    async fn interfaces(&self) -> SourceResult<Vec<InterfaceReading>> {
        let counters = parse::parse_proc_net_dev(&self.ctx.read(NET_DEV)?);

        // `ip` lookups run concurrently: at most one command timeout overall.
        let readings = counters
            .into_iter()
            .map(|(name, rx, tx)| self.interface(name, rx, tx));
        Ok(join_all(readings).await)
    }

    // ── Uptime ─────────────────────────────────────────────

    async fn uptime_secs(&self) -> SourceResult<u64> {
        let content = self.ctx.read(UPTIME)?;
        parse::parse_proc_uptime(&content).ok_or_else(|| SourceError::parse(UPTIME, "not a number"))
    }

    // ── Services ───────────────────────────────────────────

    async fn services(&self, catalog: &Catalog) -> SourceResult<Vec<Service>> {
        let with_systemd = self.ctx.exists(SYSTEMD_RUNTIME);
        services::discover_unix(&self.ctx, catalog, with_systemd).await
    }
}

/// A populated Linux host for reader and assembler tests.
#[cfg(test)]
pub(crate) fn fixture() -> (crate::mock::MockFs, crate::mock::MockExecutor) {
    use crate::mock::{MockExecutor, MockFs};

    let mut fs = MockFs::new();
    fs.add_file(
        OS_RELEASE,
        "NAME=\"Ubuntu\"\nID=ubuntu\nPRETTY_NAME=\"Ubuntu 22.04.4 LTS\"\n",
    );
    fs.add_file(KERNEL_RELEASE, "6.5.0-35-generic\n");
    fs.add_file(
        CPUINFO,
        "processor\t: 0\nmodel name\t: AMD EPYC 7763 64-Core Processor\n\nprocessor\t: 1\nmodel name\t: AMD EPYC 7763 64-Core Processor\n\nprocessor\t: 2\nmodel name\t: AMD EPYC 7763 64-Core Processor\n\nprocessor\t: 3\nmodel name\t: AMD EPYC 7763 64-Core Processor\n",
    );
    fs.add_file(LOADAVG, "1.00 0.80 0.50 2/345 6789\n");
    fs.add_file(
        MEMINFO,
        "MemTotal:        8000000 kB\nMemFree:         2000000 kB\nBuffers:          500000 kB\nCached:          1500000 kB\n",
    );
    fs.add_file(
        MOUNTS,
        "/dev/nvme0n1p2 / ext4 rw 0 0\n/dev/nvme0n1p1 /boot/efi vfat rw 0 0\ntmpfs /run tmpfs rw 0 0\n",
    );
    fs.add_mount("/", 100_000, 40_000);
    fs.add_mount("/boot/efi", 500, 400);
    fs.add_file(
        NET_DEV,
        "Inter-|   Receive |  Transmit\n face |bytes packets|bytes packets\n    lo: 10 1 0 0 0 0 0 0 10 1 0 0 0 0 0 0\n  eth0: 1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0\n",
    );
    fs.add_file("/sys/class/net/eth0/address", "52:54:00:12:34:56\n");
    fs.add_file("/sys/class/net/eth0/operstate", "up\n");
    fs.add_file(UPTIME, "3725.12 7000.00\n");
    fs.add_dir(SYSTEMD_RUNTIME);

    let exec = MockExecutor::new()
        .with_output(
            "ip -o -4 addr show dev eth0",
            "2: eth0    inet 10.1.2.3/24 brd 10.1.2.255 scope global eth0",
        )
        .with_output(
            "ps aux",
            "USER PID COMMAND\nroot 1 /sbin/init\npostgres 700 /usr/lib/postgresql/16/bin/postgres -D /var/lib/postgresql\n",
        )
        .with_output(
            "systemctl list-units --type=service --state=running --no-legend",
            "postgresql@16-main.service loaded active running PostgreSQL Cluster 16-main\ncron.service loaded active running cron\n",
        );

    (fs, exec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockExecutor, MockFs};
    use std::sync::Arc;
    use std::time::Duration;

    fn readers(fs: MockFs, exec: MockExecutor) -> LinuxReaders {
        LinuxReaders::new(ReaderContext::new(
            Arc::new(fs),
            Arc::new(exec),
            Duration::from_millis(200),
        ))
    }

    #[tokio::test]
    async fn os_from_os_release() {
        let (fs, exec) = fixture();
        let os = readers(fs, exec).os_info().await.unwrap();
        assert_eq!(os.distribution_name, "Ubuntu 22.04.4 LTS");
        assert_eq!(os.kernel_version, "6.5.0-35-generic");
        assert_eq!(os.icon_hint, "fa-ubuntu");
        assert_eq!(os.family, PlatformFamily::Linux);
    }

    #[tokio::test]
    async fn os_without_release_file_is_generic_linux() {
        let os = readers(MockFs::new(), MockExecutor::new())
            .os_info()
            .await
            .unwrap();
        assert_eq!(os.distribution_name, "Linux");
        assert_eq!(os.kernel_version, UNKNOWN);
        assert_eq!(os.icon_hint, "fa-linux");
    }

    #[tokio::test]
    async fn cpu_usage_is_load_proxy() {
        let (fs, exec) = fixture();
        let cpu = readers(fs, exec).cpu_info().await.unwrap();
        assert_eq!(cpu.model_name, "AMD EPYC 7763 64-Core Processor");
        assert_eq!(cpu.core_count, 4);
        assert_eq!(cpu.usage_percent, 25);
        assert_eq!(cpu.load_average.map(|l| l.five), Some(0.80));
    }

    #[tokio::test]
    async fn cpu_without_sources_is_an_error() {
        assert!(readers(MockFs::new(), MockExecutor::new())
            .cpu_info()
            .await
            .is_err());
    }

    #[tokio::test]
    async fn memory_missing_meminfo_is_an_error() {
        let (mut fs, exec) = fixture();
        fs.remove_file(MEMINFO);
        assert!(readers(fs, exec).memory_info().await.is_err());
    }

    #[tokio::test]
    async fn disks_skip_virtual_mounts() {
        let (fs, exec) = fixture();
        let disks = readers(fs, exec).disks().await.unwrap();
        let mounts: Vec<&str> = disks.iter().map(|d| d.mount_point.as_str()).collect();
        assert_eq!(mounts, vec!["/", "/boot/efi"]);
        assert_eq!(disks[0].usage_percent, 60);
    }

    #[tokio::test]
    async fn interfaces_degrade_per_field() {
        let (mut fs, exec) = fixture();
        fs.remove_file("/sys/class/net/eth0/operstate");
        let ifaces = readers(fs, exec).interfaces().await.unwrap();
        assert_eq!(ifaces.len(), 1);
        assert_eq!(ifaces[0].name, "eth0");
        assert_eq!(ifaces[0].ip_address, "10.1.2.3");
        assert_eq!(ifaces[0].mac_address, "52:54:00:12:34:56");
        assert_eq!(ifaces[0].link_status, LinkStatus::Unknown);
        assert_eq!(ifaces[0].counters, Some((1000, 2000)));
    }

    #[tokio::test]
    async fn hung_address_lookups_cost_one_timeout_for_all_interfaces() {
        let mut fs = MockFs::new();
        let mut net_dev = String::from("Inter-|   Receive |  Transmit\n face |bytes packets|bytes packets\n");
        let mut exec = MockExecutor::new();
        for i in 0..5 {
            net_dev.push_str(&format!("  eth{}: 100 1 0 0 0 0 0 0 200 2 0 0 0 0 0 0\n", i));
            exec = exec.with_hang(&format!("ip -o -4 addr show dev eth{}", i));
        }
        fs.add_file(NET_DEV, net_dev);

        let r = LinuxReaders::new(ReaderContext::new(
            Arc::new(fs),
            Arc::new(exec),
            Duration::from_millis(300),
        ));
        let ifaces = tokio::time::timeout(Duration::from_secs(1), r.interfaces())
            .await
            .expect("lookups should run concurrently")
            .unwrap();

        assert_eq!(ifaces.len(), 5);
        assert_eq!(ifaces[4].name, "eth4");
        assert!(ifaces.iter().all(|i| i.ip_address == UNKNOWN));
        assert!(ifaces.iter().all(|i| i.counters == Some((100, 200))));
    }

    #[tokio::test]
    async fn services_include_systemd_when_running_under_it() {
        let (fs, exec) = fixture();
        let catalog = Catalog::builtin().unwrap();
        let names: Vec<String> = readers(fs, exec)
            .services(&catalog)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.display_name)
            .collect();
        assert_eq!(names, vec!["PostgreSQL", "cron (Systemd)"]);
    }

    #[tokio::test]
    async fn uptime_whole_seconds() {
        let (fs, exec) = fixture();
        assert_eq!(readers(fs, exec).uptime_secs().await.unwrap(), 3725);
    }
}
