//! Service discovery: process, container, unit and registry listings matched
//! against the signature catalog.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::collector::ReaderContext;
use crate::error::{SourceError, SourceResult};
use crate::model::{Service, ServiceCategory, STATUS_RUNNING};

const BUILTIN_CATALOG: &str = include_str!("../catalog/services.yaml");

// ── Catalog ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct ProcessEntry {
    pattern: String,
    name: String,
    category: ServiceCategory,
    icon: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RegistryEntry {
    service: String,
    name: String,
    category: ServiceCategory,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    processes: Vec<ProcessEntry>,
    #[serde(default)]
    windows_services: Vec<RegistryEntry>,
}

/// A process-listing signature with its compiled pattern.
#[derive(Debug, Clone)]
pub struct ProcessSignature {
    pub pattern: Regex,
    pub name: String,
    pub category: ServiceCategory,
    pub icon: String,
}

impl ProcessSignature {
    fn service(&self) -> Service {
        running(self.name.clone(), self.category, self.icon.clone(), None)
    }
}

/// A Windows service registry entry.
#[derive(Debug, Clone)]
pub struct RegistrySignature {
    pub service: String,
    pub name: String,
    pub category: ServiceCategory,
    pub icon: String,
}

/// The loaded signature table. Immutable after load.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub processes: Vec<ProcessSignature>,
    pub windows_services: Vec<RegistrySignature>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG).context("built-in service catalog is invalid")
    }

    /// Load from `path`, or the built-in table when no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("invalid service catalog {}", path.display()))
            }
            None => Self::builtin(),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;

        let mut processes = Vec::with_capacity(file.processes.len());
        for entry in file.processes {
            let pattern = Regex::new(&entry.pattern).map_err(|e| SourceError::Catalog {
                name: entry.name.clone(),
                reason: e.to_string(),
            })?;
            processes.push(ProcessSignature {
                pattern,
                name: entry.name,
                category: entry.category,
                icon: entry.icon,
            });
        }

        let windows_services = file
            .windows_services
            .into_iter()
            .map(|e| RegistrySignature {
                service: e.service,
                name: e.name,
                category: e.category,
                icon: e.icon,
            })
            .collect();

        Ok(Self {
            processes,
            windows_services,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty() && self.windows_services.is_empty()
    }
}

fn running(
    display_name: String,
    category: ServiceCategory,
    icon_hint: String,
    container_image: Option<String>,
) -> Service {
    Service {
        display_name,
        category,
        status: STATUS_RUNNING.to_string(),
        icon_hint,
        container_image,
    }
}

// ── Listing parsers ────────────────────────────────────────

/// One entry per signature that matches anywhere in `listing`.
pub fn match_processes(catalog: &Catalog, listing: &str) -> Vec<Service> {
    catalog
        .processes
        .iter()
        .filter(|sig| sig.pattern.is_match(listing))
        .map(ProcessSignature::service)
        .collect()
}

/// Container runtime whose `ps` output is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    pub fn program(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "Docker",
            ContainerRuntime::Podman => "Podman",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "fa-docker",
            ContainerRuntime::Podman => "fa-box",
        }
    }
}

const CONTAINER_FORMAT: &str = "{{.Names}}|{{.Image}}|{{.Status}}";

/// `<runtime> ps --format "{{.Names}}|{{.Image}}|{{.Status}}"` output, one
/// entry per running container.
pub fn parse_containers(output: &str, runtime: ContainerRuntime) -> Vec<Service> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().splitn(3, '|');
            let name = fields.next()?.trim();
            let image = fields.next()?.trim();
            fields.next()?;
            if name.is_empty() {
                return None;
            }
            Some(running(
                format!("{} ({})", name, runtime.label()),
                ServiceCategory::Container,
                runtime.icon().to_string(),
                Some(image.to_string()),
            ))
        })
        .collect()
}

/// `systemctl list-units --type=service --state=running --no-legend` output.
pub fn parse_systemd_units(output: &str) -> Vec<Service> {
    output
        .lines()
        .filter_map(|line| {
            let unit = line
                .trim_start_matches(|c: char| c.is_whitespace() || c == '●' || c == '*')
                .split_whitespace()
                .next()?;
            let name = unit.strip_suffix(".service")?;
            let valid = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-');
            valid.then(|| {
                running(
                    format!("{} (Systemd)", name),
                    ServiceCategory::SystemUnit,
                    "fa-cog".to_string(),
                    None,
                )
            })
        })
        .collect()
}

/// Drop structurally identical entries, keeping first-seen order.
pub fn dedup(services: Vec<Service>) -> Vec<Service> {
    let mut seen = HashSet::new();
    services
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

// ── Discovery ──────────────────────────────────────────────

/// Discovery on Linux and macOS: catalog over `ps aux`, then Docker and Podman
/// containers, then systemd units when `with_systemd` is set.
///
/// Each listing is independent; one that fails contributes nothing.
pub async fn discover_unix(
    ctx: &ReaderContext,
    catalog: &Catalog,
    with_systemd: bool,
) -> SourceResult<Vec<Service>> {
    let systemd = async {
        if with_systemd {
            ctx.run(
                "systemctl",
                &[
                    "list-units",
                    "--type=service",
                    "--state=running",
                    "--no-legend",
                ],
            )
            .await
            .map(Some)
        } else {
            Ok(None)
        }
    };

    let (processes, docker, podman, units) = tokio::join!(
        ctx.run("ps", &["aux"]),
        list_containers(ctx, ContainerRuntime::Docker),
        list_containers(ctx, ContainerRuntime::Podman),
        systemd,
    );

    let mut services = Vec::new();
    match processes {
        Ok(listing) => services.extend(match_processes(catalog, &listing)),
        Err(e) => warn!(error = %e, "process listing unavailable"),
    }
    services.extend(docker);
    services.extend(podman);
    match units {
        Ok(Some(listing)) => services.extend(parse_systemd_units(&listing)),
        Ok(None) => {}
        Err(e) => debug!(error = %e, "systemd unit listing unavailable"),
    }

    Ok(dedup(services))
}

async fn list_containers(ctx: &ReaderContext, runtime: ContainerRuntime) -> Vec<Service> {
    match ctx
        .run(runtime.program(), &["ps", "--format", CONTAINER_FORMAT])
        .await
    {
        Ok(output) => parse_containers(&output, runtime),
        Err(e) => {
            debug!(runtime = runtime.program(), error = %e, "container runtime unavailable");
            Vec::new()
        }
    }
}

/// Discovery on Windows: each registry entry is checked with `sc query`.
///
/// The queries run together and results keep catalog order.
pub async fn discover_windows(ctx: &ReaderContext, catalog: &Catalog) -> SourceResult<Vec<Service>> {
    let queries = catalog.windows_services.iter().map(|sig| async move {
        match ctx.run("sc", &["query", sig.service.as_str()]).await {
            Ok(out) if out.contains("RUNNING") => Some(running(
                sig.name.clone(),
                sig.category,
                sig.icon.clone(),
                None,
            )),
            Ok(_) => None,
            Err(e) => {
                debug!(service = %sig.service, error = %e, "service query failed");
                None
            }
        }
    });

    let services = join_all(queries).await.into_iter().flatten().collect();
    Ok(dedup(services))
}
