mod cli;
mod config;
mod signals;
mod workload;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::cli::{CliArgs, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = config::load(args.config.as_deref(), args.workers)?;
    config.log_summary();

    match args.command {
        Command::Signals => signals::run(&config.signal)?,
        Command::Scheduler {
            tasks,
            iterations,
            priority,
            seed,
            json,
        } => {
            let opts = workload::WorkloadOptions {
                tasks,
                iterations,
                priority,
                seed,
                json,
            };
            workload::run(&config.scheduler, &opts)?;
        }
    }

    info!("fasync-demo finished");
    Ok(())
}
