//! Metric normalizers: raw pseudo-file and command text into typed values.
//!
//! Every function here is pure and tolerant: malformed input yields `None` or an
//! empty collection, never a panic.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::model::{clamp_percent, percent_of, LinkStatus, LoadAverage, MemoryInfo};

// ── OS ─────────────────────────────────────────────────────

pub fn parse_os_release_field(content: &str, field: &str) -> Option<String> {
    let prefix = format!("{}=", field);
    content
        .lines()
        .find(|l| l.starts_with(&prefix))
        .map(|l| l[prefix.len()..].trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

// ── CPU ────────────────────────────────────────────────────

pub fn extract_proc_field(cpuinfo: &str, field: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|l| l.starts_with(field))
        .and_then(|l| l.split_once(':'))
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Logical processor count from `/proc/cpuinfo`.
pub fn count_processors(cpuinfo: &str) -> u32 {
    cpuinfo
        .lines()
        .filter(|l| {
            l.split_once(':')
                .map(|(k, _)| k.trim() == "processor")
                .unwrap_or(false)
        })
        .count() as u32
}

/// First three fields of `/proc/loadavg`.
pub fn parse_loadavg(content: &str) -> Option<LoadAverage> {
    let loads: Vec<f64> = content
        .split_whitespace()
        .take(3)
        .filter_map(|s| s.parse().ok())
        .collect();
    match loads.as_slice() {
        [one, five, fifteen] => Some(LoadAverage {
            one: *one,
            five: *five,
            fifteen: *fifteen,
        }),
        _ => None,
    }
}

/// `sysctl -n vm.loadavg` output: `{ 1.52 1.71 1.80 }`.
pub fn parse_braced_loadavg(output: &str) -> Option<LoadAverage> {
    parse_loadavg(output.trim().trim_start_matches('{').trim_end_matches('}'))
}

/// Load-average proxy for CPU usage: `round(load1 / cores × 100)` in 0–100.
pub fn load_usage_percent(load_one: f64, core_count: u32) -> u8 {
    clamp_percent(load_one / core_count.max(1) as f64 * 100.0)
}

/// A bare numeric reading such as a performance-counter value. Accepts a comma
/// as the decimal separator.
pub fn parse_counter_percent(output: &str) -> Option<u8> {
    let value: f64 = output.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then(|| clamp_percent(value))
}

// ── Memory ─────────────────────────────────────────────────

/// A `/proc/meminfo` field in kB, matching the field name exactly.
pub fn parse_meminfo_kb(meminfo: &str, field: &str) -> Option<u64> {
    meminfo
        .lines()
        .find(|l| l.split_once(':').map(|(k, _)| k == field).unwrap_or(false))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
}

/// Kilobytes to bytes; `None` when the count does not fit.
pub fn kb_to_bytes(kb: u64) -> Option<u64> {
    kb.checked_mul(1024)
}

/// Memory accounting from `/proc/meminfo`.
///
/// Buffers and page cache are reclaimable and count as free:
/// `used = total − (free + buffers + cached)`. `None` without `MemTotal`.
pub fn parse_meminfo(meminfo: &str) -> Option<MemoryInfo> {
    let bytes = |field: &str| parse_meminfo_kb(meminfo, field).and_then(kb_to_bytes);
    let total = bytes("MemTotal")?;
    let free = bytes("MemFree").unwrap_or(0);
    let cached = bytes("Cached").unwrap_or(0);
    let buffers = bytes("Buffers").unwrap_or(0);

    let reclaimable = free.saturating_add(cached).saturating_add(buffers);
    let used = total.saturating_sub(reclaimable);
    Some(MemoryInfo {
        total_bytes: total,
        used_bytes: used,
        free_bytes: total - used,
        cached_bytes: cached,
        buffers_bytes: buffers,
        usage_percent: percent_of(used, total),
    })
}

/// Memory figures from a total and a free byte count.
pub fn memory_from_total_free(total: u64, free: u64) -> MemoryInfo {
    let free = free.min(total);
    let used = total - free;
    MemoryInfo {
        total_bytes: total,
        used_bytes: used,
        free_bytes: free,
        cached_bytes: 0,
        buffers_bytes: 0,
        usage_percent: percent_of(used, total),
    }
}

/// A `vm_stat` counter such as `Pages free:  12345.`.
pub fn parse_vm_stat_field(output: &str, field: &str) -> u64 {
    output
        .lines()
        .find(|l| l.split_once(':').map(|(k, _)| k.trim() == field).unwrap_or(false))
        .and_then(|l| {
            l.split(':')
                .nth(1)
                .and_then(|v| v.trim().trim_end_matches('.').parse().ok())
        })
        .unwrap_or(0)
}

/// Page size from the `vm_stat` header: `(page size of 16384 bytes)`.
pub fn parse_vm_stat_page_size(output: &str) -> Option<u64> {
    output
        .split("page size of ")
        .nth(1)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

// ── Disks ──────────────────────────────────────────────────

/// Mount points worth reporting from `/proc/mounts`.
///
/// `/` is always included. Other entries must be backed by a `/dev/` device and
/// not be `tmpfs`. Duplicates collapse in first-seen order.
pub fn parse_proc_mounts(content: &str) -> Vec<String> {
    let mut mounts = vec!["/".to_string()];
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let (device, mount_point, fs_type) = (parts[0], parts[1], parts[2]);
        if !device.starts_with("/dev/") || fs_type == "tmpfs" {
            continue;
        }
        let mount_point = unescape_mount_path(mount_point);
        if !mounts.contains(&mount_point) {
            mounts.push(mount_point);
        }
    }
    mounts
}

/// `/proc/mounts` encodes whitespace in paths as octal escapes (`\040`).
fn unescape_mount_path(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let octal = &bytes[i + 1..i + 4];
            if octal.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = octal.iter().fold(0u32, |acc, b| acc * 8 + (b - b'0') as u32);
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Mount points from BSD `mount` output:
/// `/dev/disk3s1s1 on / (apfs, sealed, local, read-only, journaled)`.
pub fn parse_bsd_mount(output: &str) -> Vec<String> {
    let mut mounts = vec!["/".to_string()];
    for line in output.lines() {
        let Some((device, rest)) = line.split_once(" on ") else {
            continue;
        };
        let Some((mount_point, fs_info)) = rest.rsplit_once(" (") else {
            continue;
        };
        let fs_type = fs_info.split(',').next().unwrap_or("").trim();
        if !device.starts_with("/dev/") || fs_type == "tmpfs" || fs_type == "devfs" {
            continue;
        }
        let mount_point = mount_point.to_string();
        if !mounts.contains(&mount_point) {
            mounts.push(mount_point);
        }
    }
    mounts
}

// ── Network ────────────────────────────────────────────────

pub fn is_loopback(name: &str) -> bool {
    name == "lo" || name == "lo0"
}

/// `(interface, rx_bytes, tx_bytes)` from `/proc/net/dev`, loopback excluded.
pub fn parse_proc_net_dev(content: &str) -> Vec<(String, u64, u64)> {
    let mut counters = Vec::new();
    for line in content.lines() {
        let Some((name, stats)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name.contains(' ') || is_loopback(name) {
            continue;
        }
        let parts: Vec<&str> = stats.split_whitespace().collect();
        if parts.len() < 9 {
            continue;
        }
        let (Ok(rx), Ok(tx)) = (parts[0].parse::<u64>(), parts[8].parse::<u64>()) else {
            continue;
        };
        counters.push((name.to_string(), rx, tx));
    }
    counters
}

/// `/sys/class/net/<if>/operstate`. Only an exact `up` is up.
pub fn parse_operstate(content: &str) -> LinkStatus {
    if content.trim() == "up" {
        LinkStatus::Up
    } else {
        LinkStatus::Down
    }
}

/// First IPv4 address from `ip -o -4 addr show dev <if>`.
pub fn parse_ip_addr_inet(output: &str) -> Option<String> {
    let mut words = output.split_whitespace();
    while let Some(word) = words.next() {
        if word == "inet" {
            let addr = words.next()?;
            return Some(addr.split('/').next().unwrap_or(addr).to_string());
        }
    }
    None
}

/// One interface block from BSD `ifconfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfconfigEntry {
    pub name: String,
    pub ipv4: Option<String>,
    pub mac: Option<String>,
    pub up: bool,
}

pub fn parse_ifconfig(output: &str) -> Vec<IfconfigEntry> {
    let mut entries: Vec<IfconfigEntry> = Vec::new();

    for line in output.lines() {
        if !line.starts_with('\t') && !line.starts_with(' ') && line.contains(':') {
            let name = line.split(':').next().unwrap_or("").to_string();
            let up = line.contains("<UP") || line.contains(",UP");
            entries.push(IfconfigEntry {
                name,
                ipv4: None,
                mac: None,
                up,
            });
            continue;
        }

        let Some(current) = entries.last_mut() else {
            continue;
        };
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("inet ") {
            if current.ipv4.is_none() {
                current.ipv4 = rest.split_whitespace().next().map(|s| s.to_string());
            }
        } else if let Some(rest) = trimmed.strip_prefix("ether ") {
            current.mac = rest.split_whitespace().next().map(|s| s.to_string());
        } else if let Some(rest) = trimmed.strip_prefix("status: ") {
            current.up = current.up && rest.trim() == "active";
        }
    }

    entries
}

/// Cumulative `(rx, tx)` bytes per interface from `netstat -ib`.
///
/// Interfaces appear once per address family; the link-level row carries the
/// full counters, so the maximum is kept.
pub fn parse_netstat_ib(output: &str) -> HashMap<String, (u64, u64)> {
    let mut counters: HashMap<String, (u64, u64)> = HashMap::new();
    let mut lines = output.lines();
    let Some(header) = lines.next() else {
        return counters;
    };
    let columns: Vec<&str> = header.split_whitespace().collect();
    let ibytes_col = columns.iter().position(|c| *c == "Ibytes");
    let obytes_col = columns.iter().position(|c| *c == "Obytes");
    let (Some(ibytes_col), Some(obytes_col)) = (ibytes_col, obytes_col) else {
        return counters;
    };

    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        // Rows without an Address column are one field short.
        let shift = columns.len().saturating_sub(parts.len());
        if shift > 1 || parts.is_empty() {
            continue;
        }
        let name = parts[0].trim_end_matches('*');
        let (Some(rx_idx), Some(tx_idx)) =
            (ibytes_col.checked_sub(shift), obytes_col.checked_sub(shift))
        else {
            continue;
        };
        let rx = parts.get(rx_idx).and_then(|s| s.parse::<u64>().ok());
        let tx = parts.get(tx_idx).and_then(|s| s.parse::<u64>().ok());
        if let (Some(rx), Some(tx)) = (rx, tx) {
            let entry = counters.entry(name.to_string()).or_insert((0, 0));
            entry.0 = entry.0.max(rx);
            entry.1 = entry.1.max(tx);
        }
    }
    counters
}

// ── Uptime ─────────────────────────────────────────────────

/// Whole seconds from `/proc/uptime`.
pub fn parse_proc_uptime(content: &str) -> Option<u64> {
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as u64)
}

/// `sysctl -n kern.boottime`: `{ sec = 1700000000, usec = 0 } Tue Nov 14 ...`.
pub fn parse_kern_boottime(output: &str) -> Option<DateTime<Utc>> {
    let sec_str = output.split("sec = ").nth(1)?.split(',').next()?.trim();
    let sec: i64 = sec_str.parse().ok()?;
    DateTime::from_timestamp(sec, 0)
}

/// WMI CIM datetime: `yyyymmddHHMMSS.ffffff+UUU` where `UUU` is the UTC offset
/// in minutes.
pub fn parse_cim_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let naive = NaiveDateTime::parse_from_str(value.get(..14)?, "%Y%m%d%H%M%S").ok()?;

    let offset_minutes = value
        .get(21..)
        .filter(|s| s.len() >= 2)
        .and_then(|s| {
            let (sign, digits) = s.split_at(1);
            let minutes: i32 = digits.parse().ok()?;
            match sign {
                "+" => Some(minutes),
                "-" => Some(-minutes),
                _ => None,
            }
        })
        .unwrap_or(0);

    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole seconds between `boot` and `now`, zero if the clock went backwards.
pub fn uptime_since(boot: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - boot).num_seconds().max(0) as u64
}

// ── WMI ────────────────────────────────────────────────────

/// `wmic ... /value` output: `Key=Value` lines, records separated by blank
/// lines. Keys with empty values are dropped.
pub fn parse_wmic_records(output: &str) -> Vec<HashMap<String, String>> {
    let mut records = Vec::new();
    let mut current: HashMap<String, String> = HashMap::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim();
            if !value.is_empty() {
                current.insert(key.trim().to_string(), value.to_string());
            }
        }
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

/// All `Key=Value` pairs of a single-record `wmic` query.
pub fn parse_wmic_values(output: &str) -> HashMap<String, String> {
    parse_wmic_records(output).into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:       16384000 kB
MemFree:         4096000 kB
MemAvailable:    9000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:        10000 kB
SwapTotal:       2097148 kB
";

    #[test]
    fn meminfo_counts_cache_and_buffers_as_free() {
        let mem = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(mem.total_bytes, 16_384_000 * 1024);
        assert_eq!(mem.used_bytes, (16_384_000 - 4_096_000 - 512_000 - 2_048_000) * 1024);
        assert_eq!(mem.used_bytes + mem.free_bytes, mem.total_bytes);
        assert_eq!(mem.cached_bytes, 2_048_000 * 1024);
        assert_eq!(mem.usage_percent, 59);
    }

    #[test]
    fn meminfo_does_not_confuse_swap_cached() {
        assert_eq!(parse_meminfo_kb(MEMINFO, "Cached"), Some(2_048_000));
        assert_eq!(parse_meminfo_kb(MEMINFO, "SwapCached"), Some(10_000));
    }

    #[test]
    fn meminfo_without_total_is_rejected() {
        assert!(parse_meminfo("MemFree: 100 kB\n").is_none());
        assert!(parse_meminfo("").is_none());
    }

    #[test]
    fn meminfo_with_zero_total_reports_zero_percent() {
        let mem = parse_meminfo("MemTotal: 0 kB\nMemFree: 10 kB\n").unwrap();
        assert_eq!(mem.usage_percent, 0);
        assert_eq!(mem.used_bytes, 0);
    }

    #[test]
    fn meminfo_with_oversized_total_is_rejected() {
        assert!(parse_meminfo("MemTotal: 18446744073709551615 kB\n").is_none());

        let mem = parse_meminfo("MemTotal: 1024 kB\nCached: 18446744073709551615 kB\n").unwrap();
        assert_eq!(mem.cached_bytes, 0);
        assert_eq!(mem.total_bytes, 1024 * 1024);
    }

    #[test]
    fn cpuinfo_model_and_processor_count() {
        let cpuinfo = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Xeon(R) CPU E5-2680 v4 @ 2.40GHz
processor\t: 1
model name\t: Intel(R) Xeon(R) CPU E5-2680 v4 @ 2.40GHz
";
        assert_eq!(
            extract_proc_field(cpuinfo, "model name").as_deref(),
            Some("Intel(R) Xeon(R) CPU E5-2680 v4 @ 2.40GHz")
        );
        assert_eq!(count_processors(cpuinfo), 2);
    }

    #[test]
    fn loadavg_variants() {
        let load = parse_loadavg("0.52 0.58 0.59 1/389 12345\n").unwrap();
        assert_eq!(load.one, 0.52);
        assert_eq!(load.fifteen, 0.59);
        let braced = parse_braced_loadavg("{ 1.52 1.71 1.80 }").unwrap();
        assert_eq!(braced.five, 1.71);
        assert!(parse_loadavg("garbage").is_none());
    }

    #[test]
    fn load_proxy_is_clamped() {
        assert_eq!(load_usage_percent(0.5, 4), 13);
        assert_eq!(load_usage_percent(12.0, 4), 100);
        assert_eq!(load_usage_percent(1.0, 0), 100);
        assert_eq!(load_usage_percent(-1.0, 2), 0);
    }

    #[test]
    fn counter_percent_accepts_locale_decimal() {
        assert_eq!(parse_counter_percent("12,6\r\n"), Some(13));
        assert_eq!(parse_counter_percent("101.2"), Some(100));
        assert_eq!(parse_counter_percent("n/a"), None);
    }

    #[test]
    fn proc_mounts_keeps_block_devices_only() {
        let mounts = "\
sysfs /sys sysfs rw,nosuid 0 0
proc /proc proc rw 0 0
/dev/sda1 / ext4 rw,relatime 0 0
/dev/sda2 /home ext4 rw,relatime 0 0
tmpfs /run tmpfs rw 0 0
/dev/shm /dev/shm tmpfs rw 0 0
/dev/sdb1 /mnt/My\\040Disk xfs rw 0 0
/dev/sda2 /home ext4 rw,relatime 0 0
";
        assert_eq!(
            parse_proc_mounts(mounts),
            vec!["/", "/home", "/mnt/My Disk"]
        );
    }

    #[test]
    fn bsd_mount_output() {
        let out = "\
/dev/disk3s1s1 on / (apfs, sealed, local, read-only, journaled)
devfs on /dev (devfs, local, nobrowse)
/dev/disk3s5 on /System/Volumes/Data (apfs, local, journaled, nobrowse)
map auto_home on /System/Volumes/Data/home (autofs, automounted, nobrowse)
";
        assert_eq!(parse_bsd_mount(out), vec!["/", "/System/Volumes/Data"]);
    }

    #[test]
    fn proc_net_dev_skips_header_and_loopback() {
        let dev = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0
  eth0: 123456    100    0    0    0     0          0         0   654321     90    0    0    0     0       0          0
docker0: 5 1 0 0 0 0 0 0 7 1 0 0 0 0 0 0
";
        assert_eq!(
            parse_proc_net_dev(dev),
            vec![
                ("eth0".to_string(), 123_456, 654_321),
                ("docker0".to_string(), 5, 7)
            ]
        );
    }

    #[test]
    fn operstate_and_ip_addr() {
        assert_eq!(parse_operstate("up\n"), LinkStatus::Up);
        assert_eq!(parse_operstate("dormant"), LinkStatus::Down);
        let ip = "2: eth0    inet 192.168.1.20/24 brd 192.168.1.255 scope global eth0\\       valid_lft forever";
        assert_eq!(parse_ip_addr_inet(ip).as_deref(), Some("192.168.1.20"));
        assert_eq!(parse_ip_addr_inet(""), None);
    }

    #[test]
    fn ifconfig_blocks() {
        let out = "\
lo0: flags=8049<UP,LOOPBACK,RUNNING,MULTICAST> mtu 16384
\tinet 127.0.0.1 netmask 0xff000000
en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tether a4:83:e7:12:34:56
\tinet6 fe80::1%en0 prefixlen 64 scopeid 0x6
\tinet 10.0.0.12 netmask 0xffffff00 broadcast 10.0.0.255
\tstatus: active
en1: flags=8822<BROADCAST,SMART,SIMPLEX,MULTICAST> mtu 1500
\tstatus: inactive
";
        let entries = parse_ifconfig(out);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].name, "en0");
        assert_eq!(entries[1].ipv4.as_deref(), Some("10.0.0.12"));
        assert_eq!(entries[1].mac.as_deref(), Some("a4:83:e7:12:34:56"));
        assert!(entries[1].up);
        assert!(!entries[2].up);
        assert_eq!(entries[2].ipv4, None);
    }

    #[test]
    fn netstat_ib_keeps_link_row_counters() {
        let out = "\
Name       Mtu   Network       Address            Ipkts Ierrs     Ibytes    Opkts Oerrs     Obytes  Coll
en0        1500  <Link#6>    a4:83:e7:12:34:56  100     0     5000000      90     0     700000     0
en0        1500  10.0.0/24     10.0.0.12         80     -     4000000      70     -     600000     -
utun0      1380  <Link#15>                        3     0         300       4     0        400     0
";
        let counters = parse_netstat_ib(out);
        assert_eq!(counters.get("en0"), Some(&(5_000_000, 700_000)));
        assert_eq!(counters.get("utun0"), Some(&(300, 400)));
    }

    #[test]
    fn netstat_ib_skips_short_rows_under_leading_byte_columns() {
        assert!(parse_netstat_ib("Ibytes Obytes\nen0\n").is_empty());
        assert!(parse_netstat_ib("Obytes Name Ibytes\nen0 5\n").is_empty());
    }

    #[test]
    fn uptime_sources() {
        assert_eq!(parse_proc_uptime("350735.47 234388.90\n"), Some(350_735));
        assert_eq!(parse_proc_uptime("nonsense"), None);

        let boot = parse_kern_boottime("{ sec = 1700000000, usec = 12 } Tue Nov 14 22:13:20 2023").unwrap();
        assert_eq!(boot.timestamp(), 1_700_000_000);

        let cim = parse_cim_datetime("20240101120000.500000+060").unwrap();
        assert_eq!(cim.to_rfc3339(), "2024-01-01T11:00:00+00:00");
        assert!(parse_cim_datetime("2024").is_none());

        let later = boot + chrono::Duration::seconds(90);
        assert_eq!(uptime_since(boot, later), 90);
        assert_eq!(uptime_since(later, boot), 0);
    }

    #[test]
    fn wmic_records_and_values() {
        let out = "\r\n\r\nCaption=C:\r\nFreeSpace=1000\r\nSize=4000\r\n\r\n\r\nCaption=D:\r\nFreeSpace=\r\nSize=\r\n\r\n";
        let records = parse_wmic_records(out);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Size").map(String::as_str), Some("4000"));
        assert!(records[1].get("Size").is_none());

        let values = parse_wmic_values("Name=AMD EPYC\r\nNumberOfCores=8\r\n");
        assert_eq!(values.get("NumberOfCores").map(String::as_str), Some("8"));
    }

    #[test]
    fn os_release_fields() {
        let content = "NAME=\"Ubuntu\"\nID=ubuntu\nPRETTY_NAME=\"Ubuntu 22.04.4 LTS\"\nVERSION_ID=\"22.04\"\n";
        assert_eq!(
            parse_os_release_field(content, "PRETTY_NAME").as_deref(),
            Some("Ubuntu 22.04.4 LTS")
        );
        assert_eq!(parse_os_release_field(content, "ID").as_deref(), Some("ubuntu"));
        assert_eq!(parse_os_release_field(content, "BUILD_ID"), None);
    }

    #[test]
    fn vm_stat_fields() {
        let out = "\
Mach Virtual Memory Statistics: (page size of 16384 bytes)
Pages free:                               12345.
Pages inactive:                          200000.
Pages speculative:                         5000.
";
        assert_eq!(parse_vm_stat_page_size(out), Some(16384));
        assert_eq!(parse_vm_stat_field(out, "Pages free"), 12_345);
        assert_eq!(parse_vm_stat_field(out, "Pages wired down"), 0);
    }
}
