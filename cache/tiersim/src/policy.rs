//! Write policies.
//!
//! A [`WritePolicyEngine`] decides what a write does to both tiers and what
//! flushing means. Two engines are provided:
//!
//! - [`WriteBack`]: writes only touch the cache and mark the slot dirty. A dirty
//!   slot reaches the backing store when it is evicted or flushed.
//! - [`WriteThrough`]: every write updates the cache and is committed to the
//!   backing store before returning. Slots are never dirty.
//!
//! Both allocate on a write miss: the block is loaded into an LRU victim slot
//! and then overwritten.

use crate::config::WritePolicy;
use crate::tiers::Tiers;
use crate::{BlockId, Value};
use std::fmt;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::WriteBack {}
    impl Sealed for super::WriteThrough {}
    impl<E: super::WritePolicyEngine + ?Sized> Sealed for Box<E> {}
}

/// Behavior of writes and flushes.
///
/// The simulator advances the clock, validates the block id and counts the
/// operation before calling in. Implementations record hits, misses and the
/// latency they charge.
///
/// The trait is sealed: [`WriteBack`] and [`WriteThrough`] are the only
/// engines.
///
/// ```compile_fail
/// use tiersim::{BlockId, Tiers, Value, WritePolicy, WritePolicyEngine};
///
/// #[derive(Debug)]
/// struct Custom;
///
/// impl WritePolicyEngine for Custom {
///     fn policy(&self) -> WritePolicy {
///         WritePolicy::WriteBack
///     }
///     fn write(&self, _: &mut Tiers, _: BlockId, _: Value, _: u64) -> f64 {
///         0.0
///     }
///     fn flush_all(&self, _: &mut Tiers) -> usize {
///         0
///     }
/// }
/// ```
pub trait WritePolicyEngine: sealed::Sealed + fmt::Debug + Send {
    /// Which policy this engine implements.
    fn policy(&self) -> WritePolicy;

    /// Write `value` to `block_id` at logical time `now`.
    ///
    /// Returns the simulated latency of the write.
    fn write(&self, tiers: &mut Tiers, block_id: BlockId, value: Value, now: u64) -> f64;

    /// Flush all deferred writes. Returns the number of blocks written.
    fn flush_all(&self, tiers: &mut Tiers) -> usize;
}

impl<E: WritePolicyEngine + ?Sized> WritePolicyEngine for Box<E> {
    fn policy(&self) -> WritePolicy {
        (**self).policy()
    }

    fn write(&self, tiers: &mut Tiers, block_id: BlockId, value: Value, now: u64) -> f64 {
        (**self).write(tiers, block_id, value, now)
    }

    fn flush_all(&self, tiers: &mut Tiers) -> usize {
        (**self).flush_all(tiers)
    }
}

/// Create the engine for a runtime-selected policy.
pub fn engine(policy: WritePolicy) -> Box<dyn WritePolicyEngine> {
    match policy {
        WritePolicy::WriteBack => Box::new(WriteBack),
        WritePolicy::WriteThrough => Box::new(WriteThrough),
    }
}

/// Deferred writes with a dirty bit per slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteBack;

impl WritePolicyEngine for WriteBack {
    fn policy(&self) -> WritePolicy {
        WritePolicy::WriteBack
    }

    fn write(&self, tiers: &mut Tiers, block_id: BlockId, value: Value, now: u64) -> f64 {
        let index = match tiers.find(block_id) {
            Some(index) => {
                tiers.metrics_mut().record_hit();
                index
            }
            None => {
                tiers.metrics_mut().record_miss();
                tiers.allocate(block_id, now)
            }
        };
        tiers.store_cached(index, value, now, true);

        let latency = tiers.latency().cache_write;
        tiers.metrics_mut().add_write_latency(latency);
        latency
    }

    fn flush_all(&self, tiers: &mut Tiers) -> usize {
        tiers.flush_all()
    }
}

/// Immediate commit of every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteThrough;

impl WritePolicyEngine for WriteThrough {
    fn policy(&self) -> WritePolicy {
        WritePolicy::WriteThrough
    }

    fn write(&self, tiers: &mut Tiers, block_id: BlockId, value: Value, now: u64) -> f64 {
        let index = match tiers.find(block_id) {
            Some(index) => {
                tiers.metrics_mut().record_hit();
                index
            }
            None => {
                tiers.metrics_mut().record_miss();
                tiers.allocate(block_id, now)
            }
        };
        tiers.store_cached(index, value, now, false);
        tiers.commit(block_id, value);

        let latency = tiers.latency().cache_write + tiers.latency().backing_write;
        tiers.metrics_mut().add_write_latency(latency);
        latency
    }

    fn flush_all(&self, _tiers: &mut Tiers) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn tiers() -> Tiers {
        Tiers::new(
            &SimConfig::new()
                .with_cache_capacity(2)
                .with_backing_capacity(8),
        )
    }

    #[test]
    fn test_engine_selection() {
        assert_eq!(engine(WritePolicy::WriteBack).policy(), WritePolicy::WriteBack);
        assert_eq!(
            engine(WritePolicy::WriteThrough).policy(),
            WritePolicy::WriteThrough
        );
    }

    #[test]
    fn test_write_back_miss_allocates_dirty() {
        let mut tiers = tiers();
        let latency = WriteBack.write(&mut tiers, 1, 100, 1);
        assert_eq!(latency, 0.2);

        let index = tiers.find(1).expect("block should be cached");
        assert!(tiers.table().slot(index).dirty);
        assert_eq!(tiers.cached(index), 100);
        assert_eq!(tiers.store().get(1), Some(0));

        let snapshot = tiers.metrics().snapshot();
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.backing_reads, 1);
        assert_eq!(snapshot.backing_writes, 0);
    }

    #[test]
    fn test_write_back_hit_stays_in_cache() {
        let mut tiers = tiers();
        WriteBack.write(&mut tiers, 1, 100, 1);
        WriteBack.write(&mut tiers, 1, 101, 2);

        let snapshot = tiers.metrics().snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.backing_reads, 1);
        assert_eq!(snapshot.backing_writes, 0);
        assert_eq!(tiers.store().get(1), Some(0));
        assert_eq!(tiers.table().slot(0).recency, 2);
    }

    #[test]
    fn test_write_back_flush_all() {
        let mut tiers = tiers();
        WriteBack.write(&mut tiers, 1, 100, 1);
        WriteBack.write(&mut tiers, 2, 200, 2);

        assert_eq!(WriteBack.flush_all(&mut tiers), 2);
        assert_eq!(WriteBack.flush_all(&mut tiers), 0);
        assert_eq!(tiers.store().get(1), Some(100));
        assert_eq!(tiers.store().get(2), Some(200));
    }

    #[test]
    fn test_write_through_commits() {
        let mut tiers = tiers();
        let latency = WriteThrough.write(&mut tiers, 3, 300, 1);
        assert!((latency - 10.2).abs() < 1e-9);

        assert_eq!(tiers.store().get(3), Some(300));
        assert_eq!(tiers.table().dirty_count(), 0);

        let snapshot = tiers.metrics().snapshot();
        assert_eq!(snapshot.backing_reads, 1);
        assert_eq!(snapshot.backing_writes, 1);
        assert!((snapshot.write_latency - 10.2).abs() < 1e-9);
    }

    #[test]
    fn test_write_through_hit() {
        let mut tiers = tiers();
        WriteThrough.write(&mut tiers, 3, 300, 1);
        WriteThrough.write(&mut tiers, 3, 301, 2);

        let snapshot = tiers.metrics().snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.backing_reads, 1);
        assert_eq!(snapshot.backing_writes, 2);
        assert_eq!(tiers.store().get(3), Some(301));
    }

    #[test]
    fn test_write_through_flush_all_is_noop() {
        let mut tiers = tiers();
        WriteThrough.write(&mut tiers, 3, 300, 1);
        assert_eq!(WriteThrough.flush_all(&mut tiers), 0);
        assert_eq!(tiers.metrics().snapshot().backing_writes, 1);
    }
}
