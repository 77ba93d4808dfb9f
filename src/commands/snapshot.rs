//! `hoststat snapshot`: collect once and print the result.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::collector::Collector;
use crate::config;
use crate::model::{LinkStatus, Severity, Snapshot};
use crate::rates::FileCounterStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

pub fn run(format: OutputFormat, interval: Option<f64>, config_path: Option<&Path>) -> Result<()> {
    let cfg = config::load(config_path)?;
    crate::telemetry::init(&cfg.log.level, cfg.log.format);

    if let Some(secs) = interval {
        if !secs.is_finite() || secs <= 0.0 {
            anyhow::bail!("--interval must be a positive number of seconds");
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { run_async(&cfg, format, interval).await })
}

async fn run_async(cfg: &config::Config, format: OutputFormat, interval: Option<f64>) -> Result<()> {
    // Baselines persist on disk so consecutive invocations yield rates.
    let counters = Arc::new(FileCounterStore::new(cfg.collector.counter_file()?));
    let collector = Collector::for_host(&cfg.collector, counters)?;
    let snapshot = collector.collect_with(interval).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Table => print_table(&snapshot),
    }
    Ok(())
}

pub fn fmt_bytes(bytes: u64) -> String {
    if bytes >= 1_099_511_627_776 {
        format!("{:.1} TB", bytes as f64 / 1_099_511_627_776.0)
    } else if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

pub fn fmt_rate(bytes_per_sec: Option<f64>) -> String {
    match bytes_per_sec {
        Some(rate) => format!("{}/s", fmt_bytes(rate.round() as u64)),
        None => "n/a".to_string(),
    }
}

pub fn fmt_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

fn fmt_percent(percent: u8) -> String {
    let text = format!("{}%", percent);
    match Severity::from_percent(percent) {
        Severity::Critical => text.red().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Normal => text.green().to_string(),
    }
}

fn print_table(s: &Snapshot) {
    println!("{}", "═══ Host Snapshot ═══".cyan().bold());
    println!("  Hostname:        {}", s.hostname.bold());
    if let Some(ref addr) = s.server_address {
        println!("  Address:         {}", addr);
    }
    println!("  Uptime:          {}", fmt_uptime(s.uptime_secs));
    println!("  Collected:       {}", s.collected_at.to_rfc3339());
    println!();

    // ── OS ──
    println!("{}", "── OS ──".yellow());
    println!("  Distribution:    {}", s.os.distribution_name);
    println!("  Kernel:          {}", s.os.kernel_version);
    println!("  Architecture:    {}", s.os.architecture);
    println!("  Family:          {}", s.os.family);

    // ── CPU ──
    println!();
    println!("{}", "── CPU ──".yellow());
    println!("  Model:           {}", s.cpu.model_name);
    println!(
        "  Cores/Threads:   {}/{}",
        s.cpu.core_count, s.cpu.thread_count
    );
    if let Some(load) = s.cpu.load_average {
        println!(
            "  Load:            {:.2} {:.2} {:.2}",
            load.one, load.five, load.fifteen
        );
    }
    println!("  Usage:           {}", fmt_percent(s.cpu.usage_percent));

    // ── Memory ──
    println!();
    println!("{}", "── Memory ──".yellow());
    println!(
        "  Used:            {} / {} ({})",
        fmt_bytes(s.memory.used_bytes),
        fmt_bytes(s.memory.total_bytes),
        fmt_percent(s.memory.usage_percent)
    );
    if s.memory.cached_bytes > 0 || s.memory.buffers_bytes > 0 {
        println!(
            "  Cache/Buffers:   {} / {}",
            fmt_bytes(s.memory.cached_bytes),
            fmt_bytes(s.memory.buffers_bytes)
        );
    }

    // ── Disks ──
    if !s.disks.is_empty() {
        println!();
        println!("{}", "── Disks ──".yellow());
        for d in &s.disks {
            println!(
                "  {:<20} {:>10} / {:<10} {}",
                d.mount_point,
                fmt_bytes(d.used_bytes),
                fmt_bytes(d.total_bytes),
                fmt_percent(d.usage_percent)
            );
        }
    }

    // ── Network ──
    if !s.network.is_empty() {
        println!();
        println!("{}", "── Network ──".yellow());
        for n in &s.network {
            let link = match n.link_status {
                LinkStatus::Up => "up".green().to_string(),
                LinkStatus::Down => "down".red().to_string(),
                LinkStatus::Unknown => "unknown".dimmed().to_string(),
            };
            println!(
                "  {:<12} {:<16} {:<18} {:<8} rx {:>12}  tx {:>12}",
                n.interface_name,
                n.ip_address,
                n.mac_address,
                link,
                fmt_rate(n.rx_rate_bytes_per_sec),
                fmt_rate(n.tx_rate_bytes_per_sec)
            );
        }
    }

    // ── Services ──
    println!();
    println!("{}", "── Services ──".yellow());
    if s.services.is_empty() {
        println!("  {}", "none detected".dimmed());
    }
    for svc in &s.services {
        match svc.container_image {
            Some(ref image) => println!(
                "  {} {}",
                svc.display_name.green(),
                format!("({})", image).dimmed()
            ),
            None => println!("  {}", svc.display_name.green()),
        }
    }
}
