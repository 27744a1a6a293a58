//! The simulator.
//!
//! A [`Simulator`] owns one cache table, one backing store, one logical clock
//! and one metrics recorder, and is bound to a single write policy for its
//! lifetime. Operations are processed strictly in the order given.

use crate::config::{SimConfig, WritePolicy};
use crate::error::SimResult;
use crate::metrics::MetricsSnapshot;
use crate::operation::Operation;
use crate::policy::{self, WritePolicyEngine};
use crate::store::BackingStore;
use crate::table::CacheTable;
use crate::tiers::Tiers;
use crate::{BlockId, Value};
use tracing::{debug, trace};

/// Monotonic counter ordering accesses for LRU.
///
/// Advances by exactly one per read or write. It has no relation to wall
/// time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalClock {
    now: u64,
}

impl LogicalClock {
    /// Create a clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Advance by one and return the new value.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.now += 1;
        self.now
    }
}

/// Outcome of a read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadResult {
    /// Value of the block.
    pub value: Value,
    /// Simulated latency charged to the read.
    pub latency: f64,
    /// Whether the block was already cached.
    pub hit: bool,
}

/// Simulator with a runtime-selected write policy.
pub type DynSimulator = Simulator<Box<dyn WritePolicyEngine>>;

/// Two-tier storage simulator.
#[derive(Debug)]
pub struct Simulator<P: WritePolicyEngine> {
    config: SimConfig,
    tiers: Tiers,
    clock: LogicalClock,
    policy: P,
}

impl<P: WritePolicyEngine> Simulator<P> {
    /// Create a simulator after validating `config`.
    pub fn new(config: SimConfig, policy: P) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            tiers: Tiers::new(&config),
            config,
            clock: LogicalClock::new(),
            policy,
        })
    }

    /// Read a block.
    ///
    /// A hit costs one cache read. A miss costs one backing store read,
    /// reclaims the LRU slot (flushing it first if dirty) and loads the block
    /// into it. Flush latency is charged to the write accumulator.
    pub fn read(&mut self, block_id: BlockId) -> SimResult<ReadResult> {
        self.check(block_id)?;
        let now = self.clock.tick();
        self.tiers.metrics_mut().record_read_op();

        let result = match self.tiers.find(block_id) {
            Some(index) => {
                self.tiers.metrics_mut().record_hit();
                self.tiers.touch(index, now);
                ReadResult {
                    value: self.tiers.cached(index),
                    latency: self.tiers.latency().cache_read,
                    hit: true,
                }
            }
            None => {
                self.tiers.metrics_mut().record_miss();
                let index = self.tiers.allocate(block_id, now);
                ReadResult {
                    value: self.tiers.cached(index),
                    latency: self.tiers.latency().backing_read,
                    hit: false,
                }
            }
        };

        self.tiers.metrics_mut().add_read_latency(result.latency);
        trace!(block_id, now, hit = result.hit, "read");
        Ok(result)
    }

    /// Write a block. Returns the simulated latency of the write.
    pub fn write(&mut self, block_id: BlockId, value: Value) -> SimResult<f64> {
        self.check(block_id)?;
        let now = self.clock.tick();
        self.tiers.metrics_mut().record_write_op();

        let latency = self.policy.write(&mut self.tiers, block_id, value, now);
        trace!(block_id, value, now, latency, "write");
        Ok(latency)
    }

    fn check(&self, block_id: BlockId) -> SimResult<()> {
        self.tiers.store().check(block_id).inspect_err(|e| {
            debug!(block_id, error = %e, "rejected operation");
        })
    }

    /// Flush every dirty slot. Returns the number of blocks written.
    pub fn flush_all(&mut self) -> usize {
        self.tiers.metrics_mut().record_flush_op();
        self.policy.flush_all(&mut self.tiers)
    }

    /// Process one operation.
    ///
    /// Returns the latency of reads and writes, `None` for flushes and sync
    /// markers.
    pub fn apply(&mut self, operation: &Operation) -> SimResult<Option<f64>> {
        match *operation {
            Operation::Read(block_id) => self.read(block_id).map(|r| Some(r.latency)),
            Operation::Write(block_id, value) => self.write(block_id, value).map(Some),
            Operation::FlushAll => {
                self.flush_all();
                Ok(None)
            }
            Operation::Sync => Ok(None),
        }
    }

    /// Process a stream of operations in order.
    ///
    /// Stops at the first failing operation and returns its error. Operations
    /// before it remain applied.
    pub fn replay<'a, I>(&mut self, operations: I) -> SimResult<MetricsSnapshot>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        for operation in operations {
            self.apply(operation)?;
        }
        Ok(self.metrics())
    }

    /// Current metrics.
    #[inline]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.tiers.metrics().snapshot()
    }

    /// Configuration the simulator was built with.
    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Active write policy.
    #[inline]
    pub fn policy(&self) -> WritePolicy {
        self.policy.policy()
    }

    /// The cache tier.
    #[inline]
    pub fn cache(&self) -> &CacheTable {
        self.tiers.table()
    }

    /// The durable tier.
    #[inline]
    pub fn backing(&self) -> &BackingStore {
        self.tiers.store()
    }

    /// Current logical time.
    #[inline]
    pub fn clock(&self) -> u64 {
        self.clock.now()
    }
}

impl Simulator<Box<dyn WritePolicyEngine>> {
    /// Create a simulator for a policy chosen at runtime.
    pub fn with_policy(config: SimConfig, policy: WritePolicy) -> SimResult<Self> {
        Self::new(config, policy::engine(policy))
    }
}
