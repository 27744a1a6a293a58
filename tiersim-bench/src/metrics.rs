//! Bench metrics and latency histogram helpers.

use metriken::histogram::Histogram;
use metriken::{Counter, metric};

#[metric(name = "workloads_run", description = "Workload replays completed")]
pub static WORKLOADS_RUN: Counter = Counter::new();

#[metric(
    name = "operations_replayed",
    description = "Operations applied across all workload replays"
)]
pub static OPERATIONS_REPLAYED: Counter = Counter::new();

#[metric(
    name = "operation_errors",
    description = "Operations rejected by the simulator"
)]
pub static OPERATION_ERRORS: Counter = Counter::new();

/// Simulated latency distribution of one replay.
///
/// Latencies arrive in milliseconds and are stored in microseconds.
pub struct LatencyHistogram {
    histogram: Histogram,
}

impl LatencyHistogram {
    pub fn new() -> Result<Self, String> {
        let histogram = Histogram::new(7, 64).map_err(|e| e.to_string())?;
        Ok(Self { histogram })
    }

    /// Record one operation latency in milliseconds.
    pub fn record(&mut self, latency_ms: f64) {
        let us = (latency_ms * 1000.0).round().max(0.0) as u64;
        let _ = self.histogram.increment(us);
    }

    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            p50: percentile_from_histogram(&self.histogram, 50.0),
            p99: percentile_from_histogram(&self.histogram, 99.0),
            max: percentile_from_histogram(&self.histogram, 100.0),
        }
    }
}

/// Percentiles of a replay, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub p50: f64,
    pub p99: f64,
    pub max: f64,
}

fn percentile_from_histogram(hist: &Histogram, p: f64) -> f64 {
    if let Ok(Some(results)) = hist.percentiles(&[p])
        && let Some((_pct, bucket)) = results.first()
    {
        return bucket.end() as f64;
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram_summary() {
        let hist = LatencyHistogram::new().unwrap();
        assert_eq!(hist.summary(), LatencySummary::default());
    }

    #[test]
    fn test_summary_orders_percentiles() {
        let mut hist = LatencyHistogram::new().unwrap();
        for _ in 0..98 {
            hist.record(0.1);
        }
        hist.record(8.0);
        hist.record(10.2);

        let summary = hist.summary();
        // buckets are inclusive upper bounds, so allow for bucket width
        assert!(summary.p50 >= 100.0 && summary.p50 < 110.0);
        assert!(summary.max >= 10200.0);
        assert!(summary.p50 <= summary.p99 && summary.p99 <= summary.max);
    }
}
