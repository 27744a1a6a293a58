//! Simulator metrics.
//!
//! - [`MetricsRecorder`] - Counters and latency accumulators owned by a simulator
//! - [`MetricsSnapshot`] - Point-in-time copy with derived rates and totals
//!
//! Every field only ever grows for the lifetime of one simulator.

/// Counters updated by the read path, the write policies and flushing.
#[derive(Debug, Default, Clone)]
pub struct MetricsRecorder {
    snapshot: MetricsSnapshot,
}

impl MetricsRecorder {
    /// Create a recorder with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a lookup that found its block in the cache.
    #[inline]
    pub fn record_hit(&mut self) {
        self.snapshot.hits += 1;
    }

    /// Count a lookup that did not find its block in the cache.
    #[inline]
    pub fn record_miss(&mut self) {
        self.snapshot.misses += 1;
    }

    /// Count one access to the backing store on behalf of a read or allocate.
    #[inline]
    pub fn record_backing_read(&mut self) {
        self.snapshot.backing_reads += 1;
    }

    /// Count one write to the backing store.
    #[inline]
    pub fn record_backing_write(&mut self) {
        self.snapshot.backing_writes += 1;
    }

    /// Count a processed read operation.
    #[inline]
    pub fn record_read_op(&mut self) {
        self.snapshot.read_ops += 1;
    }

    /// Count a processed write operation.
    #[inline]
    pub fn record_write_op(&mut self) {
        self.snapshot.write_ops += 1;
    }

    /// Count a processed flush-all operation.
    #[inline]
    pub fn record_flush_op(&mut self) {
        self.snapshot.flush_ops += 1;
    }

    /// Charge simulated latency to the read accumulator.
    #[inline]
    pub fn add_read_latency(&mut self, latency: f64) {
        self.snapshot.read_latency += latency;
    }

    /// Charge simulated latency to the write accumulator.
    #[inline]
    pub fn add_write_latency(&mut self, latency: f64) {
        self.snapshot.write_latency += latency;
    }

    /// Export the current values.
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot
    }
}

/// Point-in-time metrics of one simulator.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    /// Reads and writes that found their block cached.
    pub hits: u64,
    /// Reads and writes that did not find their block cached.
    pub misses: u64,
    /// Backing store reads (read misses plus write allocations).
    pub backing_reads: u64,
    /// Backing store writes (flushes plus write-through commits).
    pub backing_writes: u64,
    /// Read operations processed.
    pub read_ops: u64,
    /// Write operations processed.
    pub write_ops: u64,
    /// Flush-all operations processed.
    pub flush_ops: u64,
    /// Accumulated simulated read latency.
    pub read_latency: f64,
    /// Accumulated simulated write latency, including flushes.
    pub write_latency: f64,
}

impl MetricsSnapshot {
    /// Total cache lookups.
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate as a percentage (0.0 - 100.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Miss rate as a percentage (0.0 - 100.0).
    pub fn miss_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            (self.misses as f64 / total as f64) * 100.0
        }
    }

    /// Read plus write latency.
    pub fn total_latency(&self) -> f64 {
        self.read_latency + self.write_latency
    }

    /// Mean latency per read or write operation.
    pub fn average_latency(&self) -> f64 {
        let ops = self.read_ops + self.write_ops;
        if ops == 0 {
            0.0
        } else {
            self.total_latency() / ops as f64
        }
    }
}
