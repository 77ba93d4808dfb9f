//! Host snapshot, the single value produced by one collection.
//!
//! A `Snapshot` is assembled fresh for every request and handed to the caller
//! by value. Nothing in here is shared or mutated after assembly.

use std::fmt;

use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::PlatformFamily;

/// Placeholder for best-effort string fields that could not be read.
pub const UNKNOWN: &str = "unknown";

/// Complete health snapshot of this host.
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Snapshot {
    pub collected_at: DateTime<Utc>,
    pub collector_version: String,
    pub hostname: String,
    /// First IPv4 address found on a non-loopback interface.
    #[serde(default)]
    pub server_address: Option<String>,
    pub uptime_secs: u64,
    pub os: OsInfo,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disks: Vec<DiskInfo>,
    pub network: Vec<NetworkInterface>,
    pub services: Vec<Service>,
}

// ── OS ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct OsInfo {
    pub family: PlatformFamily,
    pub distribution_name: String,
    pub kernel_version: String,
    pub architecture: String,
    pub icon_hint: String,
}

impl OsInfo {
    /// Minimal OS description when nothing beyond the family is known.
    pub fn generic(family: PlatformFamily) -> Self {
        Self {
            family,
            distribution_name: family.label().to_string(),
            kernel_version: UNKNOWN.into(),
            architecture: std::env::consts::ARCH.to_string(),
            icon_hint: family.icon_hint().to_string(),
        }
    }
}

// ── CPU ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct CpuInfo {
    pub model_name: String,
    /// Never zero, so it is always safe to divide by.
    pub core_count: u32,
    pub thread_count: u32,
    /// Present on Linux and macOS only.
    #[serde(default)]
    pub load_average: Option<LoadAverage>,
    /// 0–100.
    ///
    /// On Linux and macOS this is the 1-minute load average divided by the core
    /// count, not instantaneous utilization: it can read above zero on an idle
    /// sampling window and saturates at 100 however oversubscribed the host is.
    /// On Windows it is the instantaneous processor-time counter.
    pub usage_percent: u8,
}

impl Default for CpuInfo {
    fn default() -> Self {
        Self {
            model_name: UNKNOWN.into(),
            core_count: 1,
            thread_count: 1,
            load_average: None,
            usage_percent: 0,
        }
    }
}

// ── Memory ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    /// Page cache, reclaimable and not counted as used (Linux only).
    pub cached_bytes: u64,
    /// Kernel buffers, reclaimable and not counted as used (Linux only).
    pub buffers_bytes: u64,
    pub usage_percent: u8,
}

// ── Disks ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SimpleObject)]
pub struct DiskInfo {
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: u8,
}

impl DiskInfo {
    /// Build an entry from one total/free query pair. `used + free == total`
    /// holds exactly; a free figure above the total is clamped to it.
    pub fn new(mount_point: impl Into<String>, total_bytes: u64, free_bytes: u64) -> Self {
        let free_bytes = free_bytes.min(total_bytes);
        let used_bytes = total_bytes - free_bytes;
        Self {
            mount_point: mount_point.into(),
            total_bytes,
            used_bytes,
            free_bytes,
            usage_percent: percent_of(used_bytes, total_bytes),
        }
    }
}

// ── Network ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Up,
    Down,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct NetworkInterface {
    pub interface_name: String,
    pub ip_address: String,
    pub mac_address: String,
    pub link_status: LinkStatus,
    #[serde(default)]
    pub rx_bytes_total: Option<u64>,
    #[serde(default)]
    pub tx_bytes_total: Option<u64>,
    /// Absent until a previous sample for this interface exists.
    #[serde(default)]
    pub rx_rate_bytes_per_sec: Option<f64>,
    #[serde(default)]
    pub tx_rate_bytes_per_sec: Option<f64>,
}

// ── Services ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "camelCase")]
pub enum ServiceCategory {
    Webserver,
    Database,
    Runtime,
    Container,
    SystemUnit,
    Fileshare,
    Network,
    Dns,
    Ftp,
    Remote,
    Mail,
    #[serde(alias = "message")]
    Messaging,
    Monitoring,
}

impl ServiceCategory {
    /// The catalog spelling, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Webserver => "webserver",
            ServiceCategory::Database => "database",
            ServiceCategory::Runtime => "runtime",
            ServiceCategory::Container => "container",
            ServiceCategory::SystemUnit => "systemUnit",
            ServiceCategory::Fileshare => "fileshare",
            ServiceCategory::Network => "network",
            ServiceCategory::Dns => "dns",
            ServiceCategory::Ftp => "ftp",
            ServiceCategory::Remote => "remote",
            ServiceCategory::Mail => "mail",
            ServiceCategory::Messaging => "messaging",
            ServiceCategory::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const STATUS_RUNNING: &str = "running";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, SimpleObject)]
pub struct Service {
    pub display_name: String,
    pub category: ServiceCategory,
    /// Only running services are reported.
    pub status: String,
    pub icon_hint: String,
    #[serde(default)]
    pub container_image: Option<String>,
}

// ── Display banding ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            p if p > 90 => Severity::Critical,
            p if p > 70 => Severity::Warning,
            _ => Severity::Normal,
        }
    }
}

/// `round(part / whole × 100)` clamped to 0–100; 0 when `whole` is 0.
pub fn percent_of(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    clamp_percent((part as f64 / whole as f64) * 100.0)
}

/// Round and clamp an arbitrary percentage into 0–100.
pub fn clamp_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
