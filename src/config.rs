use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub daemon: DaemonConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Upper bound for any single external command.
    pub command_timeout_ms: u64,
    /// Upper bound for each sub-collector of one snapshot.
    pub collect_timeout_ms: u64,
    /// Service catalog replacing the built-in one.
    pub catalog_path: Option<PathBuf>,
    /// Where one-shot invocations keep network counter baselines.
    pub counter_file: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: 3_000,
            collect_timeout_ms: 10_000,
            catalog_path: None,
            counter_file: None,
        }
    }
}

impl CollectorConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.collect_timeout_ms)
    }

    /// Configured counter file, else `<cache_dir>/hoststat/counters.json`.
    pub fn counter_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.counter_file {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir().context("could not determine cache directory")?;
        Ok(cache_dir.join("hoststat").join("counters.json"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub http_addr: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:9274".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("hoststat").join("config.yaml"))
    }
}

/// Defaults, then the YAML file, then `HOSTSTAT_*` environment variables
/// (`__` separates nesting levels, e.g. `HOSTSTAT_DAEMON__HTTP_ADDR`).
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        None => {
            if let Ok(default_path) = Config::path() {
                if default_path.exists() {
                    figment = figment.merge(Yaml::file(default_path));
                }
            }
        }
    }

    figment
        .merge(Env::prefixed("HOSTSTAT_").split("__"))
        .extract()
        .context("invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_file() {
        let config = Config::default();
        assert_eq!(config.collector.command_timeout(), Duration::from_secs(3));
        assert_eq!(config.collector.collect_timeout(), Duration::from_secs(10));
        assert_eq!(config.daemon.http_addr, "127.0.0.1:9274");
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn yaml_overrides_defaults_partially() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "collector:\n  command_timeout_ms: 500\ndaemon:\n  http_addr: 0.0.0.0:8080\nlog:\n  format: json\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.collector.command_timeout_ms, 500);
        assert_eq!(config.collector.collect_timeout_ms, 10_000);
        assert_eq!(config.daemon.http_addr, "0.0.0.0:8080");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn counter_file_override() {
        let config = CollectorConfig {
            counter_file: Some(PathBuf::from("/tmp/c.json")),
            ..Default::default()
        };
        assert_eq!(config.counter_file().unwrap(), PathBuf::from("/tmp/c.json"));
    }
}
