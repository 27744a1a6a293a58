//! Cache slot table.
//!
//! The table is a fixed array of [`CacheSlot`]s. Slot positions are stable, so
//! a slot index is the handle used by lookup, eviction and flushing. A
//! block-id index makes [`CacheTable::find`] constant time; victim selection
//! still walks the slot array in index order (see [`crate::eviction`]).

use crate::eviction;
use crate::{BlockId, Value};
use ahash::AHashMap;

/// One cache slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSlot {
    /// Block held by this slot, `None` while the slot is unoccupied.
    pub block_id: Option<BlockId>,
    /// Cached copy of the block value.
    pub data: Value,
    /// Logical clock value of the last access.
    pub recency: u64,
    /// Data differs from the backing store. Only ever set under write-back.
    pub dirty: bool,
}

impl CacheSlot {
    /// Whether the slot holds a block.
    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.block_id.is_some()
    }

    /// Whether the slot holds a block that must be flushed before reuse.
    #[inline]
    pub fn needs_flush(&self) -> bool {
        self.is_occupied() && self.dirty
    }
}

/// Fixed-capacity array of cache slots.
#[derive(Debug, Clone)]
pub struct CacheTable {
    slots: Vec<CacheSlot>,
    index: AHashMap<BlockId, usize>,
}

impl CacheTable {
    /// Create a table with `capacity` empty slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![CacheSlot::default(); capacity],
            index: AHashMap::with_capacity(capacity),
        }
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.index.len()
    }

    /// Number of occupied slots marked dirty.
    pub fn dirty_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.needs_flush()).count()
    }

    /// Slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity()`.
    #[inline]
    pub fn slot(&self, index: usize) -> &CacheSlot {
        &self.slots[index]
    }

    /// Iterate over all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheSlot> {
        self.slots.iter()
    }

    /// Find the occupied slot holding `block_id`.
    #[inline]
    pub fn find(&self, block_id: BlockId) -> Option<usize> {
        let found = self.index.get(&block_id).copied();
        debug_assert_eq!(
            found,
            self.slots
                .iter()
                .position(|slot| slot.block_id == Some(block_id))
        );
        found
    }

    /// Pick the slot to reclaim for a new block.
    #[inline]
    pub fn select_victim(&self) -> usize {
        eviction::select_victim(&self.slots)
    }

    /// Install `block_id` into the slot at `index` as a clean copy.
    ///
    /// Whatever block the slot held before is dropped; callers flush dirty
    /// victims first.
    pub(crate) fn install(&mut self, index: usize, block_id: BlockId, data: Value, now: u64) {
        let slot = &mut self.slots[index];
        if let Some(previous) = slot.block_id.replace(block_id) {
            self.index.remove(&previous);
        }
        slot.data = data;
        slot.recency = now;
        slot.dirty = false;
        self.index.insert(block_id, index);
    }

    /// Refresh the recency of an occupied slot.
    #[inline]
    pub(crate) fn touch(&mut self, index: usize, now: u64) {
        self.slots[index].recency = now;
    }

    /// Overwrite the data of an occupied slot and refresh its recency.
    pub(crate) fn store(&mut self, index: usize, data: Value, now: u64, dirty: bool) {
        let slot = &mut self.slots[index];
        slot.data = data;
        slot.recency = now;
        slot.dirty |= dirty;
    }

    /// Clear the dirty flag of a slot.
    #[inline]
    pub(crate) fn mark_clean(&mut self, index: usize) {
        self.slots[index].dirty = false;
    }
}
