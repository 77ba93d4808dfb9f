//! Rate calculator: network throughput from cumulative counters carried between
//! polls.
//!
//! Counters live in a [`CounterStore`]. The read-previous/write-current pair is
//! a single `swap` under the store's lock, so concurrent pollers never lose a
//! baseline. For the file store that lock spans processes.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::warn;

use crate::collector::InterfaceReading;
use crate::model::NetworkInterface;

/// Cumulative byte counters of one interface at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSample {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub sampled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

/// `(current − previous) / max(elapsed, 1)` per direction.
///
/// `None` without a previous sample. A counter that went backwards (interface
/// reset, wrap) yields 0. `elapsed_override` replaces the timestamp delta.
pub fn throughput(
    previous: Option<&CounterSample>,
    current: &CounterSample,
    elapsed_override: Option<f64>,
) -> Option<Throughput> {
    let previous = previous?;
    let elapsed = elapsed_override.unwrap_or_else(|| {
        (current.sampled_at - previous.sampled_at).num_milliseconds() as f64 / 1000.0
    });
    let elapsed = if elapsed.is_finite() { elapsed.max(1.0) } else { 1.0 };

    Some(Throughput {
        rx_bytes_per_sec: current.rx_bytes.saturating_sub(previous.rx_bytes) as f64 / elapsed,
        tx_bytes_per_sec: current.tx_bytes.saturating_sub(previous.tx_bytes) as f64 / elapsed,
    })
}

// ── Stores ─────────────────────────────────────────────────

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Store `current` for `interface`, returning the sample it replaced.
    async fn swap(&self, interface: &str, current: CounterSample) -> Result<Option<CounterSample>>;

    /// Swap several interfaces at once. Stores with expensive writes override
    /// this to persist once.
    async fn swap_all(
        &self,
        current: Vec<(String, CounterSample)>,
    ) -> Result<HashMap<String, CounterSample>> {
        let mut previous = HashMap::new();
        for (interface, sample) in current {
            if let Some(prev) = self.swap(&interface, sample).await? {
                previous.insert(interface, prev);
            }
        }
        Ok(previous)
    }
}

/// Baselines held for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, CounterSample>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn swap(&self, interface: &str, current: CounterSample) -> Result<Option<CounterSample>> {
        let mut counters = self.counters.lock().await;
        Ok(counters.insert(interface.to_string(), current))
    }
}

/// Baselines persisted as JSON so separate CLI invocations share them.
///
/// Each swap holds an advisory lock on a sibling `.lock` file across
/// load and persist, so concurrent processes serialize. Writes go to a uniquely
/// named temp file renamed into place, so the file is always complete. A
/// missing or corrupt file is an empty baseline.
pub struct FileCounterStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCounterStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn load(path: &Path) -> HashMap<String, CounterSample> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "counter file unreadable, starting fresh");
            return HashMap::new();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "counter file corrupt, starting fresh");
        HashMap::new()
    })
}

fn persist(path: &Path, counters: &HashMap<String, CounterSample>) -> Result<()> {
    let content = serde_json::to_vec_pretty(counters).context("failed to serialize counters")?;

    let mut tmp = NamedTempFile::new_in(parent_dir(path))
        .with_context(|| format!("creating temp file next to {}", path.display()))?;
    tmp.write_all(&content)
        .with_context(|| format!("writing temp file {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;

    Ok(())
}

/// Load, swap and persist under the cross-process lock.
fn swap_locked(
    path: &Path,
    current: Vec<(String, CounterSample)>,
) -> Result<HashMap<String, CounterSample>> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;

    let lock_path = path.with_extension("json.lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("opening lock file {}", lock_path.display()))?;
    let mut lock = RwLock::new(lock_file);
    let _held = lock
        .write()
        .with_context(|| format!("locking {}", lock_path.display()))?;

    let mut counters = load(path);
    let mut previous = HashMap::new();
    for (interface, sample) in current {
        if let Some(prev) = counters.insert(interface.clone(), sample) {
            previous.insert(interface, prev);
        }
    }
    persist(path, &counters)?;
    Ok(previous)
}

#[async_trait]
impl CounterStore for FileCounterStore {
    async fn swap(&self, interface: &str, current: CounterSample) -> Result<Option<CounterSample>> {
        let mut previous = self
            .swap_all(vec![(interface.to_string(), current)])
            .await?;
        Ok(previous.remove(interface))
    }

    async fn swap_all(
        &self,
        current: Vec<(String, CounterSample)>,
    ) -> Result<HashMap<String, CounterSample>> {
        let _guard = self.write_lock.lock().await;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || swap_locked(&path, current))
            .await
            .context("counter store task failed")?
    }
}

// ── Calculator ─────────────────────────────────────────────

/// Turns interface readings into snapshot entries, attaching rates against the
/// stored baseline and replacing it.
#[derive(Clone)]
pub struct RateCalculator {
    store: Arc<dyn CounterStore>,
}

impl RateCalculator {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn annotate(
        &self,
        readings: Vec<InterfaceReading>,
        sampled_at: DateTime<Utc>,
        elapsed_override: Option<f64>,
    ) -> Vec<NetworkInterface> {
        let current: Vec<(String, CounterSample)> = readings
            .iter()
            .filter_map(|r| {
                r.counters.map(|(rx_bytes, tx_bytes)| {
                    (
                        r.name.clone(),
                        CounterSample {
                            rx_bytes,
                            tx_bytes,
                            sampled_at,
                        },
                    )
                })
            })
            .collect();
        let samples: HashMap<String, CounterSample> = current.iter().cloned().collect();

        let previous = if current.is_empty() {
            HashMap::new()
        } else {
            self.store.swap_all(current).await.unwrap_or_else(|e| {
                warn!(error = %e, "counter store unavailable, rates omitted");
                HashMap::new()
            })
        };

        readings
            .into_iter()
            .map(|r| {
                let sample = samples.get(&r.name);
                let rate = sample.and_then(|cur| throughput(previous.get(&r.name), cur, elapsed_override));
                NetworkInterface {
                    rx_bytes_total: sample.map(|s| s.rx_bytes),
                    tx_bytes_total: sample.map(|s| s.tx_bytes),
                    rx_rate_bytes_per_sec: rate.map(|t| t.rx_bytes_per_sec),
                    tx_rate_bytes_per_sec: rate.map(|t| t.tx_bytes_per_sec),
                    interface_name: r.name,
                    ip_address: r.ip_address,
                    mac_address: r.mac_address,
                    link_status: r.link_status,
                }
            })
            .collect()
    }
}
