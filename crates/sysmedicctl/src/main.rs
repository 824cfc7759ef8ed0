//! Sysmedic Control - interactive system diagnosis and guided repair.

mod interrupt;
mod menu;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use sysmedic_common::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sysmedicctl")]
#[command(about = "System diagnostics and guided remediation for Debian-based hosts", long_about = None)]
#[command(version)]
struct Cli {
    /// Run without prompts; checks are reported, fixes are never executed
    #[arg(short = 'n', long)]
    non_interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Describe an issue in your own words for targeted troubleshooting
    #[arg(short, long)]
    issue: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::new();
    config.set_verbose(cli.verbose || config.verbose);
    config.set_non_interactive(cli.non_interactive);

    init_logging(&config).context("failed to set up logging")?;

    let interrupt_flag = interrupt::install();

    if let Some(description) = cli.issue {
        menu::run_custom_diagnosis(&config, &description, interrupt_flag);
    } else if config.non_interactive {
        menu::run_scan_only(&config);
    } else {
        menu::run_menu(&config, interrupt_flag)?;
    }

    Ok(())
}

/// Log to a timestamped file under the configured log directory. A log
/// directory that cannot be created is a setup failure and exits
/// non-zero.
fn init_logging(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.log_dir).with_context(|| {
        format!("cannot create log directory {}", config.log_dir.display())
    })?;

    let filename = format!(
        "sysmedic_{}.log",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_dir.join(&filename))
        .context("cannot open log file")?;

    let filter = if config.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();

    tracing::info!("sysmedicctl v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}
