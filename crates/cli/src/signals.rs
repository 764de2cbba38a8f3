//! `signals` subcommand: objects wired to signals, emitted on and off thread.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use fasync_core::SignalConfig;
use fasync_signal::{connect, connect_method, connect_weak, emit, EmissionGroup, Signal};

/// Re-emits the sum of its inputs on `mul_signal`.
struct Calculator {
    sum_signal: Signal<(i32, i32)>,
    mul_signal: Signal<(i32, i32)>,
}

impl Calculator {
    fn new(config: &SignalConfig) -> Arc<Self> {
        let calc = Arc::new(Self {
            sum_signal: Signal::with_config(config),
            mul_signal: Signal::with_config(config),
        });
        // weak: the calculator owns the signal holding this subscriber
        connect_weak(&calc.sum_signal, &calc, Calculator::sum);
        connect(&calc.mul_signal, |(a, b)| println!("mul was: {}", a * b));
        calc
    }

    fn sum(&self, (a, b): (i32, i32)) {
        let sum = a + b;
        println!("sum was: {sum}");
        emit(&self.mul_signal, (sum, 2));
    }
}

struct Worker {
    name: String,
}

impl Worker {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }

    fn do_work(&self, (a, b): (i32, i32)) {
        println!("worker {} result: {}", self.name, a * (a + b));
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        println!("worker {} dropped", self.name);
    }
}

fn report_product((a, _): (i32, i32)) {
    println!("product input: {a}");
}

pub fn run(config: &SignalConfig) -> Result<()> {
    info!("running signals demo");

    let calc = Calculator::new(config);
    let ta = Worker::new("ta");
    let tb = Worker::new("tb");

    connect_method(&calc.sum_signal, Arc::clone(&ta), Worker::do_work);
    let bound = Arc::clone(&tb);
    connect(&calc.sum_signal, move |args| bound.do_work(args));
    connect(&calc.mul_signal, report_product);

    let mut group = EmissionGroup::new();

    let spawned = calc
        .sum_signal
        .emit_async_multi(&mut group, (5, 2))
        .context("first multi emission failed")?;
    println!("after emit 1 ({spawned} threads)");

    calc.sum_signal
        .emit_async_into(&mut group, (13, 3))
        .context("single-thread emission failed")?;
    println!("after emit 2");

    let spawned = calc
        .sum_signal
        .emit_async_multi(&mut group, (53, 1))
        .context("second multi emission failed")?;
    println!("after emit 3 ({spawned} threads)");

    let joined = group.join_all().context("emission thread panicked")?;
    info!(joined, "all emissions joined");

    drop(ta);
    drop(tb);
    Ok(())
}
