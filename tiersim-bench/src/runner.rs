//! Replays a workload through a fresh simulator.

use crate::metrics::{
    LatencyHistogram, LatencySummary, OPERATION_ERRORS, OPERATIONS_REPLAYED, WORKLOADS_RUN,
};
use tiersim::{DynSimulator, MetricsSnapshot, Operation, SimConfig, SimError, WritePolicy};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("workload '{name}' failed at operation {index} ({operation}): {source}")]
    Operation {
        name: String,
        index: usize,
        operation: Operation,
        #[source]
        source: SimError,
    },
    #[error("{0}")]
    Simulator(#[from] SimError),
    #[error("failed to create latency histogram: {0}")]
    Histogram(String),
    #[error("replay thread for workload '{name}' panicked")]
    Panicked { name: String },
}

/// Outcome of replaying one workload under one policy.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub name: String,
    pub policy: WritePolicy,
    pub operations: usize,
    pub snapshot: MetricsSnapshot,
    pub latency: LatencySummary,
}

/// Replay `operations` against a new simulator built from `config`.
///
/// The replay stops at the first rejected operation.
pub fn run_workload(
    name: &str,
    policy: WritePolicy,
    config: &SimConfig,
    operations: &[Operation],
) -> Result<RunResult, RunError> {
    let mut sim = DynSimulator::with_policy(config.clone(), policy)?;
    let mut histogram = LatencyHistogram::new().map_err(RunError::Histogram)?;

    debug!(workload = name, %policy, operations = operations.len(), "replay starting");

    for (index, operation) in operations.iter().enumerate() {
        match sim.apply(operation) {
            Ok(Some(latency)) => histogram.record(latency),
            Ok(None) => {}
            Err(source) => {
                OPERATION_ERRORS.increment();
                return Err(RunError::Operation {
                    name: name.to_string(),
                    index,
                    operation: *operation,
                    source,
                });
            }
        }
        OPERATIONS_REPLAYED.increment();
    }

    let snapshot = sim.metrics();
    WORKLOADS_RUN.increment();

    info!(
        workload = name,
        %policy,
        hit_rate = format!("{:.2}%", snapshot.hit_rate()),
        backing_writes = snapshot.backing_writes,
        total_ms = format!("{:.2}", snapshot.total_latency()),
        "replay complete"
    );

    Ok(RunResult {
        name: name.to_string(),
        policy,
        operations: operations.len(),
        snapshot,
        latency: histogram.summary(),
    })
}
