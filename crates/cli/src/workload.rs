//! `scheduler` subcommand: a CPU-bound workload run through the scheduler
//! and again on the calling thread.

use std::hint::black_box;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use fasync_core::SchedulerConfig;
use fasync_scheduler::{Priority, Scheduler};

pub struct WorkloadOptions {
    pub tasks: usize,
    pub iterations: usize,
    pub priority: Priority,
    pub seed: u64,
    pub json: bool,
}

/// Repeatedly double and halve `a / c`. Returns `None` when `c` is zero.
pub fn oscillate(a: f64, c: f64, iterations: usize) -> Option<f64> {
    if c == 0.0 {
        return None;
    }
    let mut res = a / c;
    let mut multiplier = 2.0;
    for i in 0..iterations {
        res = black_box(res * multiplier);
        multiplier = if i % 2 == 0 { 0.5 } else { 2.0 };
    }
    Some(res)
}

fn random_args(rng: &mut StdRng, n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|_| (rng.gen_range(1.0..300.0), rng.gen_range(1.0..300.0)))
        .collect()
}

fn print_result(res: Option<f64>) {
    if let Some(res) = res {
        println!("number: {res}");
    }
}

pub fn run(config: &SchedulerConfig, opts: &WorkloadOptions) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let iterations = opts.iterations;

    let begin = Instant::now();
    let scheduler = Scheduler::with_config(config).context("failed to start scheduler")?;
    info!(
        workers = scheduler.worker_count(),
        tasks = opts.tasks,
        priority = %opts.priority,
        "submitting workload"
    );
    for (a, c) in random_args(&mut rng, opts.tasks) {
        scheduler.bind_with(
            opts.priority,
            move |(a, c): (f64, f64)| print_result(oscillate(a, c, iterations)),
            (a, c),
        );
    }
    let submitted = begin.elapsed();
    let metrics = scheduler.shutdown().context("scheduler workers panicked")?;
    let drained = begin.elapsed();

    let begin = Instant::now();
    for (a, c) in random_args(&mut rng, opts.tasks) {
        print_result(oscillate(a, c, iterations));
    }
    let sequential = begin.elapsed();

    println!("time elapsed submit: {} ms", submitted.as_millis());
    println!("time elapsed scheduler: {} ms", drained.as_millis());
    println!("time elapsed sync: {} ms", sequential.as_millis());

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!(
            "workers: {}  submitted: {}  executed: {}  skipped: {}",
            metrics.workers, metrics.submitted, metrics.executed, metrics.skipped
        );
    }
    Ok(())
}
