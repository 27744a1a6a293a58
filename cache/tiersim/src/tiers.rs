//! Combined state of both tiers.
//!
//! [`Tiers`] bundles the cache table, the backing store and the metrics
//! recorder with the latency model. It provides the primitives shared by the
//! read path and the write policies: lookup, slot allocation with LRU
//! eviction, flushing, and direct commits to the backing store.

use crate::config::{LatencyModel, SimConfig};
use crate::metrics::MetricsRecorder;
use crate::store::BackingStore;
use crate::table::CacheTable;
use crate::{BlockId, Value};
use tracing::{debug, trace};

/// Cache tier, durable tier and their bookkeeping.
///
/// Only the simulator and the write policies mutate the tiers. Outside the
/// crate they are read-only, so the cache can never hold the same block twice
/// and every block id reaching the store has already been checked.
///
/// ```compile_fail
/// use tiersim::{SimConfig, Tiers};
///
/// let mut tiers = Tiers::new(&SimConfig::new());
/// tiers.allocate(1, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Tiers {
    table: CacheTable,
    store: BackingStore,
    metrics: MetricsRecorder,
    latency: LatencyModel,
}

impl Tiers {
    /// Create empty tiers sized by `config`, which must already be valid.
    pub(crate) fn new(config: &SimConfig) -> Self {
        Self {
            table: CacheTable::new(config.cache_capacity),
            store: BackingStore::new(config.backing_capacity),
            metrics: MetricsRecorder::new(),
            latency: config.latency,
        }
    }

    /// The cache tier.
    #[inline]
    pub fn table(&self) -> &CacheTable {
        &self.table
    }

    /// The durable tier.
    #[inline]
    pub fn store(&self) -> &BackingStore {
        &self.store
    }

    /// The metrics recorder.
    #[inline]
    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Mutable access to the metrics recorder.
    #[inline]
    pub(crate) fn metrics_mut(&mut self) -> &mut MetricsRecorder {
        &mut self.metrics
    }

    /// Per-access latencies.
    #[inline]
    pub fn latency(&self) -> &LatencyModel {
        &self.latency
    }

    /// Slot holding `block_id`, if cached.
    #[inline]
    pub fn find(&self, block_id: BlockId) -> Option<usize> {
        self.table.find(block_id)
    }

    /// Cached value at `index`.
    #[inline]
    pub fn cached(&self, index: usize) -> Value {
        self.table.slot(index).data
    }

    /// Mark the slot at `index` as used at `now`.
    #[inline]
    pub(crate) fn touch(&mut self, index: usize, now: u64) {
        self.table.touch(index, now);
    }

    /// Overwrite the cached value at `index`, optionally marking it dirty.
    #[inline]
    pub(crate) fn store_cached(&mut self, index: usize, value: Value, now: u64, dirty: bool) {
        self.table.store(index, value, now, dirty);
    }

    /// Bring `block_id` into the cache and return its slot.
    ///
    /// Counts one backing store read. The victim is chosen by LRU and flushed
    /// first if it is dirty. No latency is charged here; callers charge
    /// whatever their operation costs.
    pub(crate) fn allocate(&mut self, block_id: BlockId, now: u64) -> usize {
        debug_assert!(
            self.table.find(block_id).is_none(),
            "block {} is already cached",
            block_id
        );
        self.metrics.record_backing_read();

        let victim = self.table.select_victim();
        if let Some(evicted) = self.table.slot(victim).block_id {
            debug!(
                slot = victim,
                evicted,
                block_id,
                dirty = self.table.slot(victim).dirty,
                "evicting LRU slot"
            );
            self.flush(victim);
        }

        let data = self.store.read(block_id);
        self.table.install(victim, block_id, data, now);
        victim
    }

    /// Write a dirty slot back to the backing store.
    ///
    /// Charges one backing store write against the write latency. Returns
    /// `false` without doing anything if the slot is empty or clean.
    pub(crate) fn flush(&mut self, index: usize) -> bool {
        let slot = self.table.slot(index);
        let block_id = match slot.block_id {
            Some(block_id) if slot.dirty => block_id,
            _ => return false,
        };
        let data = slot.data;

        self.store.write(block_id, data);
        self.metrics.add_write_latency(self.latency.backing_write);
        self.metrics.record_backing_write();
        self.table.mark_clean(index);

        trace!(slot = index, block_id, "flushed dirty slot");
        true
    }

    /// Flush every dirty slot in index order. Returns the number flushed.
    pub(crate) fn flush_all(&mut self) -> usize {
        let mut flushed = 0;
        for index in 0..self.table.capacity() {
            if self.flush(index) {
                flushed += 1;
            }
        }
        debug!(flushed, "flush all");
        flushed
    }

    /// Write `value` straight to the backing store.
    ///
    /// Counts one backing store write. Latency is left to the caller.
    pub(crate) fn commit(&mut self, block_id: BlockId, value: Value) {
        self.store.write(block_id, value);
        self.metrics.record_backing_write();
    }
}
