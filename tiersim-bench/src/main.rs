//! Tiered cache simulator bench: replays workload files under one or both
//! write policies and reports hit rates, backing store traffic and simulated
//! latency.

mod config;
mod driver;
mod logging;
mod metrics;
mod output;
mod runner;
mod workload;

use crate::config::{Config, PolicySelection};

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tiersim-bench")]
#[command(about = "Tiered cache write policy simulator")]
#[command(version)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write policies to run: write-back, write-through or both
    #[arg(long)]
    policy: Option<PolicySelection>,

    /// Regenerate workload files before running
    #[arg(long)]
    generate: bool,

    /// Seed for workload generation
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(policy) = args.policy {
        config.simulator.policy = policy;
    }
    if args.generate {
        config.workload.generate = true;
    }
    if let Some(seed) = args.seed {
        config.workload.seed = seed;
    }

    logging::init(&config.logging);

    if let Err(e) = run(config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let policies = config.simulator.policy.policies();
    output::print_config(&config, &policies);

    let outcome = driver::run(&config)?;
    driver::report(&outcome, &policies);

    if !outcome.failures.is_empty() {
        for failure in &outcome.failures {
            eprintln!("Failed: {failure}");
        }
        return Err(format!("{} workload(s) failed", outcome.failures.len()).into());
    }
    Ok(())
}
