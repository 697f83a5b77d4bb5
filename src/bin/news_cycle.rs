//! news-cycle
//!
//! Command-line driver for the headline scheduler: run one cycle, keep
//! cycling on an interval, or inspect and edit the persisted queue.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::warn;

use headline_scheduler::builders::{build_finviz_coordinator, build_queue};
use headline_scheduler::config::SchedulerConfig;
use headline_scheduler::core::{AppResult, QueueSnapshot};
use headline_scheduler::runtime::{queue_status, relay_interrupts, run_cycles};
use headline_scheduler::util::init_tracing;

/// Budgeted per-ticker news importer
#[derive(Parser)]
#[command(name = "news-cycle", version, about = "Budgeted per-ticker news importer")]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single cycle, or process the given tickers only
    Run {
        /// Tickers to process instead of running the selection pass
        tickers: Vec<String>,
    },

    /// Run cycles on an interval until Ctrl-C
    Watch {
        /// Seconds between cycles (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Print the persisted queue
    Status {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Add tickers to the persisted queue
    Register {
        /// Tickers to add
        #[arg(required = true)]
        tickers: Vec<String>,
    },

    /// Zero every headline count in the persisted queue
    Reset,
}

fn load_config(path: Option<&PathBuf>) -> AppResult<SchedulerConfig> {
    let mut cfg = match path {
        Some(path) => SchedulerConfig::from_json_file(path).map_err(anyhow::Error::msg)?,
        None => SchedulerConfig::default(),
    };
    cfg.apply_env_overrides();
    cfg.validate().map_err(anyhow::Error::msg)?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref()).context("failed to load configuration")?;

    match cli.command {
        Command::Run { tickers } => {
            let mut coordinator = build_finviz_coordinator(&cfg)?;
            let report = if tickers.is_empty() {
                coordinator.run_cycle().await?
            } else {
                coordinator.process_tickers(&tickers).await?
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            coordinator.close()?;
        }
        Command::Watch { interval } => {
            let coordinator = build_finviz_coordinator(&cfg)?;
            let interval = interval.map_or_else(|| cfg.cycle_interval(), Duration::from_secs);
            let (tx, rx) = watch::channel(false);
            let queue = Arc::clone(coordinator.queue());
            let snapshot_path = cfg.snapshot_path.clone();
            tokio::spawn(relay_interrupts(
                || async { tokio::signal::ctrl_c().await.is_ok() },
                tx,
                move || {
                    if let Err(e) = QueueSnapshot::save(&queue, &snapshot_path) {
                        warn!(error = %e, "final snapshot failed");
                    }
                    std::process::exit(130);
                },
            ));
            let coordinator = run_cycles(coordinator, interval, rx).await?;
            coordinator.close()?;
        }
        Command::Status { json } => {
            let status = queue_status(&build_queue(&cfg)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!(
                    "{} records, {} skipped, {} headlines, threshold {}%",
                    status.len, status.skipped, status.total_headlines, status.threshold
                );
                for record in &status.records {
                    let flag = if record.skip { " (skip)" } else { "" };
                    println!("{:<10} {:>6}{flag}", record.ticker, record.headline_count);
                }
            }
        }
        Command::Register { tickers } => {
            let queue = build_queue(&cfg)?;
            let added = queue.register_all(&tickers)?;
            QueueSnapshot::save(&queue, &cfg.snapshot_path)?;
            println!("registered {added} new ticker(s), {} total", queue.len());
        }
        Command::Reset => {
            let queue = build_queue(&cfg)?;
            let reset = queue.reset_headline_counts();
            QueueSnapshot::save(&queue, &cfg.snapshot_path)?;
            println!("reset {reset} record(s)");
        }
    }
    Ok(())
}
