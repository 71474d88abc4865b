//! Basic Governor daemon
//!
//! Loads configuration, starts the governor stack and its background loops,
//! and logs a status line on every system-monitor tick until Ctrl-C.

use anyhow::Context;
use bgov_infrastructure::constants::SHUTDOWN_TIMEOUT_SECS;
use bgov_infrastructure::logging::{init_logging, log_governor_status};
use bgov_infrastructure::{ConfigLoader, GovernorStack, ShutdownCoordinator, SysinfoSampler};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Command line interface for the governor daemon
#[derive(Parser, Debug)]
#[command(name = "bgov")]
#[command(about = "Basic Governor - resource governor for a multi-user BASIC service")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let config = loader.load().context("loading configuration")?;

    if cli.print_config {
        let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    init_logging(&config.logging).context("initialising logging")?;

    let sampler = SysinfoSampler::new().context("starting process sampler")?;
    let stack = GovernorStack::from_config(&config, Arc::new(sampler));
    let coordinator = ShutdownCoordinator::new();
    stack.spawn_monitors(&coordinator);

    let period = Duration::from_secs(config.system.resource_monitor_interval_secs);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(pid = std::process::id(), "Governor running, press Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "Ctrl-C handler failed, shutting down");
                }
                break;
            }
            _ = ticker.tick() => match stack.snapshot() {
                Ok((system, sessions)) => log_governor_status(&system, &sessions),
                Err(err) => warn!(error = %err, "Status snapshot failed"),
            },
        }
    }

    let clean = coordinator
        .shutdown(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS))
        .await;
    if let Ok((system, _)) = stack.snapshot() {
        info!(
            stats = %serde_json::to_string(&system).unwrap_or_default(),
            "Final system snapshot"
        );
    }
    info!(clean, "Governor stopped");
    Ok(())
}
