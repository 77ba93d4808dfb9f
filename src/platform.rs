use anyhow::{bail, Result};
use async_graphql::Enum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating-system family of the host. Decides which source readers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Linux,
    Windows,
    #[serde(rename = "macos")]
    MacOs,
    Unknown,
}

impl PlatformFamily {
    /// Classify a host identification string such as `std::env::consts::OS`
    /// or `uname -s` output. Never fails: anything unrecognised is `Unknown`.
    pub fn from_os_name(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        if lower.contains("linux") {
            PlatformFamily::Linux
        } else if lower.starts_with("win") {
            PlatformFamily::Windows
        } else if lower == "macos" || lower.contains("darwin") {
            PlatformFamily::MacOs
        } else {
            PlatformFamily::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlatformFamily::Linux => "Linux",
            PlatformFamily::Windows => "Windows Server",
            PlatformFamily::MacOs => "macOS",
            PlatformFamily::Unknown => "Unknown system",
        }
    }

    pub fn icon_hint(&self) -> &'static str {
        match self {
            PlatformFamily::Linux => "fa-linux",
            PlatformFamily::Windows => "fa-windows",
            PlatformFamily::MacOs => "fa-apple",
            PlatformFamily::Unknown => "fa-server",
        }
    }

    /// Whether the kernel exposes a load average.
    pub fn has_load_average(&self) -> bool {
        matches!(self, PlatformFamily::Linux | PlatformFamily::MacOs)
    }
}

impl FromStr for PlatformFamily {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linux" => Ok(PlatformFamily::Linux),
            "windows" => Ok(PlatformFamily::Windows),
            "macos" => Ok(PlatformFamily::MacOs),
            "unknown" => Ok(PlatformFamily::Unknown),
            other => bail!(
                "unknown platform '{}' (expected 'linux', 'windows', 'macos' or 'unknown')",
                other
            ),
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformFamily::Linux => write!(f, "linux"),
            PlatformFamily::Windows => write!(f, "windows"),
            PlatformFamily::MacOs => write!(f, "macos"),
            PlatformFamily::Unknown => write!(f, "unknown"),
        }
    }
}

/// Family of the running host.
pub fn detect() -> PlatformFamily {
    PlatformFamily::from_os_name(std::env::consts::OS)
}

/// Font Awesome icon for a Linux distribution, keyed by `/etc/os-release` `ID`.
pub fn distro_icon(distro_id: &str) -> &'static str {
    match distro_id {
        "ubuntu" => "fa-ubuntu",
        "debian" => "fa-debian",
        "centos" | "rhel" | "fedora" => "fa-redhat",
        _ => "fa-linux",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_host_identification_strings() {
        assert_eq!(PlatformFamily::from_os_name("linux"), PlatformFamily::Linux);
        assert_eq!(PlatformFamily::from_os_name("Linux"), PlatformFamily::Linux);
        assert_eq!(PlatformFamily::from_os_name("windows"), PlatformFamily::Windows);
        assert_eq!(PlatformFamily::from_os_name("WINNT"), PlatformFamily::Windows);
        assert_eq!(PlatformFamily::from_os_name("macos"), PlatformFamily::MacOs);
        assert_eq!(PlatformFamily::from_os_name("Darwin"), PlatformFamily::MacOs);
        assert_eq!(PlatformFamily::from_os_name("freebsd"), PlatformFamily::Unknown);
        assert_eq!(PlatformFamily::from_os_name(""), PlatformFamily::Unknown);
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for family in [
            PlatformFamily::Linux,
            PlatformFamily::Windows,
            PlatformFamily::MacOs,
            PlatformFamily::Unknown,
        ] {
            assert_eq!(family.to_string().parse::<PlatformFamily>().unwrap(), family);
        }
        assert!("beos".parse::<PlatformFamily>().is_err());
    }

    #[test]
    fn load_average_only_on_unix_families() {
        assert!(PlatformFamily::Linux.has_load_average());
        assert!(PlatformFamily::MacOs.has_load_average());
        assert!(!PlatformFamily::Windows.has_load_average());
        assert!(!PlatformFamily::Unknown.has_load_average());
    }

    #[test]
    fn distro_icons() {
        assert_eq!(distro_icon("ubuntu"), "fa-ubuntu");
        assert_eq!(distro_icon("rhel"), "fa-redhat");
        assert_eq!(distro_icon("arch"), "fa-linux");
    }
}
