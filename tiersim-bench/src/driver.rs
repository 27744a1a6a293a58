//! Bench driver: generates and loads workload files, replays them under each
//! selected policy and prints the reports.
//!
//! A workload that fails (unreadable file, rejected block id) is reported and
//! left out of the tables; the others still run.

use crate::config::Config;
use crate::output;
use crate::runner::{self, RunError, RunResult};
use crate::workload::{self, WorkloadError};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::Arc;
use std::thread;
use tiersim::{Operation, SimConfig, WritePolicy};
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no workload files found (run with --generate to create them)")]
    NoWorkloads,
    #[error("failed to generate workload: {0}")]
    Generate(#[source] WorkloadError),
    #[error("failed to spawn replay thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A failed workload and why it failed.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    #[error("workload '{name}': {source}")]
    Load {
        name: String,
        #[source]
        source: WorkloadError,
    },
    #[error(transparent)]
    Replay(RunError),
}

/// Everything a bench run produced.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Completed replays, grouped by policy and in workload order.
    pub results: Vec<RunResult>,
    pub failures: Vec<Failure>,
}

/// A parsed workload ready for replay.
#[derive(Debug, Clone)]
pub struct Workload {
    pub name: String,
    pub operations: Arc<Vec<Operation>>,
}

/// Generate (if requested), load and replay every configured workload.
pub fn run(config: &Config) -> Result<Outcome, DriverError> {
    let policies = config.simulator.policy.policies();

    if config.workload.generate {
        generate_workloads(config).map_err(DriverError::Generate)?;
    }

    let mut outcome = Outcome::default();
    let workloads = load_workloads(config, &mut outcome.failures)?;

    let sim_config = config.simulator.sim_config();
    for policy in policies {
        for result in run_policy(&sim_config, policy, &workloads)? {
            match result {
                Ok(result) => outcome.results.push(result),
                Err(e) => {
                    error!(error = %e, "replay failed");
                    outcome.failures.push(Failure::Replay(e));
                }
            }
        }
    }

    info!(
        workloads = crate::metrics::WORKLOADS_RUN.value(),
        operations = crate::metrics::OPERATIONS_REPLAYED.value(),
        failures = outcome.failures.len(),
        "bench complete"
    );

    Ok(outcome)
}

/// Print per-workload statistics and the comparison tables.
pub fn report(outcome: &Outcome, policies: &[WritePolicy]) {
    for result in &outcome.results {
        output::print_statistics(result);
    }
    for &policy in policies {
        let runs: Vec<&RunResult> = outcome
            .results
            .iter()
            .filter(|r| r.policy == policy)
            .collect();
        if !runs.is_empty() {
            output::print_comparison(policy, &runs);
        }
    }
    if policies.len() > 1 {
        let pairs = policy_pairs(&outcome.results);
        if !pairs.is_empty() {
            output::print_policy_comparison(&pairs);
        }
    }
}

/// Match each write-back result with the write-through run of the same
/// workload.
fn policy_pairs(results: &[RunResult]) -> Vec<(&RunResult, &RunResult)> {
    results
        .iter()
        .filter(|r| r.policy == WritePolicy::WriteBack)
        .filter_map(|back| {
            results
                .iter()
                .find(|r| r.policy == WritePolicy::WriteThrough && r.name == back.name)
                .map(|through| (back, through))
        })
        .collect()
}

fn generate_workloads(config: &Config) -> Result<(), WorkloadError> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.workload.seed);

    for file in &config.workload.files {
        let Some(pattern) = file.pattern else {
            warn!(workload = %file.name, "no pattern configured, not generating");
            continue;
        };
        let path = config.workload.path_of(file);
        let ops = workload::generate(pattern, file.operation_count(), &mut rng);
        workload::save(&path, &file.name, &ops)?;
        info!(
            workload = %file.name,
            %pattern,
            operations = ops.len(),
            path = %path.display(),
            "generated workload"
        );
    }
    Ok(())
}

/// Load every configured workload in order.
///
/// Missing files are skipped with a warning. Files that cannot be read or
/// parsed are recorded in `failures`. Fails only if nothing loaded.
fn load_workloads(
    config: &Config,
    failures: &mut Vec<Failure>,
) -> Result<Vec<Workload>, DriverError> {
    let mut workloads = Vec::new();

    for file in &config.workload.files {
        let path = config.workload.path_of(file);
        match workload::load(&path) {
            Ok(ops) => {
                info!(workload = %file.name, operations = ops.len(), "loaded workload");
                workloads.push(Workload {
                    name: file.name.clone(),
                    operations: Arc::new(ops),
                });
            }
            Err(WorkloadError::NotFound(path)) => {
                warn!(
                    workload = %file.name,
                    path = %path.display(),
                    "workload file not found, skipping"
                );
            }
            Err(source) => {
                error!(workload = %file.name, error = %source, "failed to load workload");
                failures.push(Failure::Load {
                    name: file.name.clone(),
                    source,
                });
            }
        }
    }

    if workloads.is_empty() {
        return Err(DriverError::NoWorkloads);
    }
    Ok(workloads)
}

/// Replay every workload on its own thread under `policy`.
///
/// All threads are joined before returning. Results come back in workload
/// order regardless of completion order.
fn run_policy(
    sim_config: &SimConfig,
    policy: WritePolicy,
    workloads: &[Workload],
) -> Result<Vec<Result<RunResult, RunError>>, DriverError> {
    let mut handles = Vec::with_capacity(workloads.len());

    for (id, workload) in workloads.iter().enumerate() {
        let name = workload.name.clone();
        let ops = Arc::clone(&workload.operations);
        let sim_config = sim_config.clone();

        let handle = thread::Builder::new()
            .name(format!("replay-{policy}-{id}"))
            .spawn(move || runner::run_workload(&name, policy, &sim_config, &ops))
            .map_err(DriverError::Spawn)?;
        handles.push((workload.name.clone(), handle));
    }

    Ok(handles
        .into_iter()
        .map(|(name, handle)| {
            handle
                .join()
                .unwrap_or_else(|_| Err(RunError::Panicked { name }))
        })
        .collect())
}
