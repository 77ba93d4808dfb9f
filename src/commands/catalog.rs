//! `hoststat catalog`: list the service signatures in effect.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::config;
use crate::services::Catalog;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let cfg = config::load(config_path)?;
    let catalog = Catalog::load(cfg.collector.catalog_path.as_deref())?;

    let source = match cfg.collector.catalog_path {
        Some(ref path) => path.display().to_string(),
        None => "built-in".to_string(),
    };
    println!("{} ({})", "═══ Service Catalog ═══".cyan().bold(), source.dimmed());

    if catalog.is_empty() {
        println!("  {}", "no signatures".dimmed());
        return Ok(());
    }

    println!("{}", "── Process signatures ──".yellow());
    for sig in &catalog.processes {
        println!(
            "  {:<18} {:<12} {:<20} {}",
            sig.name.bold(),
            sig.category.as_str(),
            sig.icon,
            sig.pattern.as_str().dimmed()
        );
    }

    println!();
    println!("{}", "── Windows services ──".yellow());
    for sig in &catalog.windows_services {
        println!(
            "  {:<18} {:<12} {:<20} {}",
            sig.name.bold(),
            sig.category.as_str(),
            sig.icon,
            sig.service.dimmed()
        );
    }

    Ok(())
}
