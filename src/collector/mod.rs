//! Source readers and the snapshot assembler.
//!
//! One [`SourceReaderSet`] implementation per platform family reads the OS
//! sources listed in its module; [`Collector`] runs them concurrently and
//! assembles the result.

mod assembler;
mod linux;
mod macos;
pub mod parse;
mod windows;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{SourceError, SourceResult};
use crate::exec::{CommandExecutor, SystemExecutor};
use crate::fs::{FileSystem, RealFs};
use crate::model::{CpuInfo, DiskInfo, LinkStatus, MemoryInfo, OsInfo, Service};
use crate::platform::PlatformFamily;
use crate::services::Catalog;

pub use assembler::Collector;
pub use linux::LinuxReaders;
pub use macos::MacOsReaders;
pub use windows::WindowsReaders;

/// What every reader needs: the filesystem and command seams plus the
/// per-command timeout.
#[derive(Clone)]
pub struct ReaderContext {
    pub fs: Arc<dyn FileSystem>,
    pub exec: Arc<dyn CommandExecutor>,
    pub command_timeout: Duration,
}

impl ReaderContext {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        exec: Arc<dyn CommandExecutor>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            fs,
            exec,
            command_timeout,
        }
    }

    /// The real filesystem and real processes.
    pub fn host(command_timeout: Duration) -> Self {
        Self::new(
            Arc::new(RealFs::new()),
            Arc::new(SystemExecutor::new()),
            command_timeout,
        )
    }

    /// Read a pseudo-file, naming it in the error.
    pub fn read(&self, path: &str) -> SourceResult<String> {
        self.fs
            .read_to_string(Path::new(path))
            .map_err(|e| SourceError::unavailable(path, e))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.fs.exists(Path::new(path))
    }

    /// Run a command bounded by the per-command timeout.
    pub async fn run(&self, program: &str, args: &[&str]) -> SourceResult<String> {
        Ok(self
            .exec
            .run(program, args, self.command_timeout)
            .await?)
    }

    /// Total and free bytes of one mount point. Each query may fail on its own.
    pub fn disk(&self, mount_point: &str) -> SourceResult<DiskInfo> {
        let path = Path::new(mount_point);
        let total = self
            .fs
            .total_space(path)
            .map_err(|e| SourceError::unavailable(mount_point, e))?;
        let free = self
            .fs
            .free_space(path)
            .map_err(|e| SourceError::unavailable(mount_point, e))?;
        Ok(DiskInfo::new(mount_point, total, free))
    }
}

/// One network interface as read, before rates are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceReading {
    pub name: String,
    pub ip_address: String,
    pub mac_address: String,
    pub link_status: LinkStatus,
    /// Cumulative `(rx, tx)` bytes, when the platform exposes them.
    pub counters: Option<(u64, u64)>,
}

/// Readers for one platform family.
///
/// Every method defaults to the documented empty value, so a family that has
/// no source for a metric simply does not override it.
#[async_trait]
pub trait SourceReaderSet: Send + Sync {
    fn family(&self) -> PlatformFamily;

    async fn os_info(&self) -> SourceResult<OsInfo> {
        Ok(OsInfo::generic(self.family()))
    }

    async fn cpu_info(&self) -> SourceResult<CpuInfo> {
        Ok(CpuInfo::default())
    }

    async fn memory_info(&self) -> SourceResult<MemoryInfo> {
        Ok(MemoryInfo::default())
    }

    async fn disks(&self) -> SourceResult<Vec<DiskInfo>> {
        Ok(Vec::new())
    }

    async fn interfaces(&self) -> SourceResult<Vec<InterfaceReading>> {
        Ok(Vec::new())
    }

    async fn uptime_secs(&self) -> SourceResult<u64> {
        Ok(0)
    }

    async fn services(&self, _catalog: &Catalog) -> SourceResult<Vec<Service>> {
        Ok(Vec::new())
    }
}

/// Readers for a host we have no sources for. Everything stays at defaults.
pub struct UnknownReaders;

#[async_trait]
impl SourceReaderSet for UnknownReaders {
    fn family(&self) -> PlatformFamily {
        PlatformFamily::Unknown
    }
}

/// The reader set for `family`.
pub fn readers_for(family: PlatformFamily, ctx: ReaderContext) -> Box<dyn SourceReaderSet> {
    match family {
        PlatformFamily::Linux => Box::new(LinuxReaders::new(ctx)),
        PlatformFamily::MacOs => Box::new(MacOsReaders::new(ctx)),
        PlatformFamily::Windows => Box::new(WindowsReaders::new(ctx)),
        PlatformFamily::Unknown => Box::new(UnknownReaders),
    }
}
