use clap::{Parser, Subcommand};

use fasync_scheduler::Priority;

/// Demonstration driver for the fasync signal and scheduler primitives.
#[derive(Parser, Debug)]
#[command(name = "fasync-demo", version, about)]
pub struct CliArgs {
    /// Path to a fasync TOML config file (defaults plus env vars when unset)
    #[arg(long, env = "FASYNC_CONFIG", global = true)]
    pub config: Option<String>,

    /// Worker thread count override for the scheduler
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wire objects to signals and emit synchronously and asynchronously
    Signals,

    /// Run CPU-bound tasks through the scheduler and time them against a sequential loop
    Scheduler {
        /// Number of tasks to submit
        #[arg(long, default_value_t = 10)]
        tasks: usize,

        /// Loop iterations per task
        #[arg(long, default_value_t = 10_000_000)]
        iterations: usize,

        /// Priority for every submitted task: low, normal or high
        #[arg(long, default_value = "normal")]
        priority: Priority,

        /// Seed for the random task arguments
        #[arg(long, default_value_t = 5489)]
        seed: u64,

        /// Print final scheduler metrics as JSON
        #[arg(long)]
        json: bool,
    },
}
