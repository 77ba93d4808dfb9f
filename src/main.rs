use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hoststat::commands::{self, snapshot::OutputFormat};

#[derive(Parser)]
#[command(name = "hoststat", version, about = "Host health snapshots: CPU, memory, disks, network and services")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect one snapshot of this host and print it
    Snapshot {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Seconds to divide network counter deltas by (default: time since the previous run)
        #[arg(long)]
        interval: Option<f64>,

        /// Path to config file (default: ~/.config/hoststat/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the hoststat daemon (REST + GraphQL)
    Serve {
        /// HTTP listen address (overrides config)
        #[arg(long)]
        http_addr: Option<String>,

        /// Log level (overrides config)
        #[arg(long)]
        log_level: Option<String>,

        /// Path to config file (default: ~/.config/hoststat/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the service signatures in effect
    Catalog {
        /// Path to config file (default: ~/.config/hoststat/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Snapshot {
            format,
            interval,
            config,
        } => commands::snapshot::run(format, interval, config.as_deref()),
        Commands::Serve {
            http_addr,
            log_level,
            config,
        } => commands::serve::run(http_addr, log_level, config.as_deref()),
        Commands::Catalog { config } => commands::catalog::run(config.as_deref()),
    }
}
