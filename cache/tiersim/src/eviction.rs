//! LRU victim selection.
//!
//! Selection walks the slots in index order:
//!
//! 1. The first unoccupied slot wins. Empty capacity is filled before
//!    anything is reclaimed.
//! 2. Otherwise the occupied slot with the smallest recency wins. Ties go to
//!    the lowest slot index.
//!
//! The tie-break decides which block gets evicted, so it must not depend on
//! hashing or insertion order.

use crate::table::CacheSlot;

/// Select the slot to reclaim.
///
/// # Panics
///
/// Panics if `slots` is empty. A validated configuration always has at least
/// one slot.
pub fn select_victim(slots: &[CacheSlot]) -> usize {
    assert!(!slots.is_empty(), "cache table has no slots");

    if let Some(free) = slots.iter().position(|slot| !slot.is_occupied()) {
        return free;
    }

    let mut victim = 0;
    let mut oldest = slots[0].recency;
    for (index, slot) in slots.iter().enumerate().skip(1) {
        // strict comparison keeps the lowest index on ties
        if slot.recency < oldest {
            oldest = slot.recency;
            victim = index;
        }
    }
    victim
}
