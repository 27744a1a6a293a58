//! Policy behavior tests.
//!
//! These tests drive complete simulators through short operation sequences
//! and check hit/miss accounting, backing store traffic and LRU choices for
//! both write policies.

use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tiersim::{
    Operation, SimConfig, SimError, Simulator, Value, WriteBack, WritePolicy, WritePolicyEngine,
    WriteThrough, engine,
};

fn two_slot_config() -> SimConfig {
    SimConfig::new().with_cache_capacity(2)
}

/// Check that occupancy never exceeds capacity and block ids are unique.
fn assert_table_invariants<P: WritePolicyEngine>(sim: &Simulator<P>) {
    let cache = sim.cache();
    let ids: Vec<usize> = cache.iter().filter_map(|slot| slot.block_id).collect();
    assert!(ids.len() <= cache.capacity());
    assert_eq!(ids.len(), cache.occupied());

    let unique: HashSet<usize> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate block ids: {:?}", ids);

    for (index, slot) in cache.iter().enumerate() {
        if let Some(block_id) = slot.block_id {
            assert_eq!(cache.find(block_id), Some(index));
        }
    }
}

// =============================================================================
// Concrete scenarios (two slots, default latencies)
// =============================================================================

#[test]
fn test_write_back_writes_then_read() {
    let mut sim = Simulator::new(two_slot_config(), WriteBack).unwrap();

    sim.write(1, 100).unwrap();
    sim.write(2, 200).unwrap();
    let read = sim.read(1).unwrap();

    let metrics = sim.metrics();
    assert_eq!(metrics.misses, 2);
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.backing_writes, 0);
    assert_eq!(read.value, 100);
    assert!(read.hit);
}

#[test]
fn test_write_back_eviction_flushes_lru() {
    let mut sim = Simulator::new(two_slot_config(), WriteBack).unwrap();
    sim.write(1, 100).unwrap();
    sim.write(2, 200).unwrap();
    sim.read(1).unwrap();

    // block 1 was just touched, so block 2 is least recently used
    sim.write(3, 300).unwrap();

    assert_eq!(sim.cache().find(2), None);
    assert!(sim.cache().find(1).is_some());
    assert!(sim.cache().find(3).is_some());
    assert_eq!(sim.metrics().backing_writes, 1);
    assert_eq!(sim.backing().get(2), Some(200));
    assert_eq!(sim.backing().get(1), Some(0));
    assert_eq!(sim.backing().get(3), Some(0));
}

#[test]
fn test_write_through_same_sequence() {
    let mut sim = Simulator::new(two_slot_config(), WriteThrough).unwrap();
    sim.write(1, 100).unwrap();
    sim.write(2, 200).unwrap();
    assert_eq!(sim.read(1).unwrap().value, 100);

    let metrics = sim.metrics();
    assert_eq!(metrics.misses, 2);
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.backing_writes, 2);

    sim.write(3, 300).unwrap();
    assert_eq!(sim.cache().find(2), None);
    // only the new write reaches the backing store, the eviction is free
    assert_eq!(sim.metrics().backing_writes, 3);
    assert_eq!(sim.backing().get(3), Some(300));
}

#[test]
fn test_flush_all_twice() {
    let mut sim = Simulator::new(two_slot_config(), WriteBack).unwrap();
    sim.write(1, 100).unwrap();
    sim.write(2, 200).unwrap();
    assert_eq!(sim.cache().dirty_count(), 2);

    assert_eq!(sim.flush_all(), 2);
    assert_eq!(sim.metrics().backing_writes, 2);

    assert_eq!(sim.flush_all(), 0);
    assert_eq!(sim.metrics().backing_writes, 2);
    assert_eq!(sim.cache().dirty_count(), 0);
    assert_eq!(sim.backing().get(1), Some(100));
    assert_eq!(sim.backing().get(2), Some(200));
}

// =============================================================================
// Latency accounting
// =============================================================================

#[test]
fn test_write_back_latency() {
    let mut sim = Simulator::new(two_slot_config(), WriteBack).unwrap();

    // write misses charge only the cache write
    assert_eq!(sim.write(1, 1).unwrap(), 0.2);
    assert_eq!(sim.write(2, 2).unwrap(), 0.2);

    // read miss evicts dirty block 1: the flush goes to the write total
    let read = sim.read(3).unwrap();
    assert_eq!(read.latency, 8.0);

    let metrics = sim.metrics();
    assert_eq!(metrics.read_latency, 8.0);
    assert!((metrics.write_latency - 10.4).abs() < 1e-9);
    assert!((metrics.total_latency() - 18.4).abs() < 1e-9);
    assert_eq!(metrics.backing_reads, 3);
}

#[test]
fn test_write_through_latency() {
    let mut sim = Simulator::new(two_slot_config(), WriteThrough).unwrap();

    let latency = sim.write(1, 1).unwrap();
    assert!((latency - 10.2).abs() < 1e-9);
    let latency = sim.write(1, 2).unwrap();
    assert!((latency - 10.2).abs() < 1e-9);

    let metrics = sim.metrics();
    assert!((metrics.write_latency - 20.4).abs() < 1e-9);
    assert_eq!(metrics.read_latency, 0.0);
}

#[test]
fn test_custom_latency_model() {
    let latency = tiersim::LatencyModel {
        cache_read: 1.0,
        cache_write: 2.0,
        backing_read: 30.0,
        backing_write: 40.0,
    };
    let config = two_slot_config().with_latency(latency);
    let mut sim = Simulator::new(config, WriteThrough).unwrap();

    assert_eq!(sim.read(0).unwrap().latency, 30.0);
    assert_eq!(sim.read(0).unwrap().latency, 1.0);
    assert_eq!(sim.write(0, 9).unwrap(), 42.0);
}

// =============================================================================
// LRU
// =============================================================================

#[test]
fn test_lru_evicts_first_read_block() {
    let capacity = 4;
    let config = SimConfig::new().with_cache_capacity(capacity);
    let mut sim = Simulator::new(config, WriteBack).unwrap();

    for block_id in 0..capacity {
        sim.read(block_id).unwrap();
    }
    assert_eq!(sim.cache().occupied(), capacity);
    assert_eq!(sim.metrics().backing_writes, 0);

    sim.read(capacity).unwrap();
    assert_eq!(sim.cache().find(0), None);
    for block_id in 1..=capacity {
        assert!(sim.cache().find(block_id).is_some());
    }
}

#[test]
fn test_lru_respects_reaccess() {
    let config = SimConfig::new().with_cache_capacity(3);
    let mut sim = Simulator::new(config, WriteThrough).unwrap();

    sim.read(10).unwrap();
    sim.read(11).unwrap();
    sim.read(12).unwrap();
    sim.read(10).unwrap();

    sim.read(13).unwrap();
    assert_eq!(sim.cache().find(11), None);
    assert!(sim.cache().find(10).is_some());
}

#[test]
fn test_empty_slot_filled_before_eviction() {
    let config = SimConfig::new().with_cache_capacity(3);
    let mut sim = Simulator::new(config, WriteBack).unwrap();

    sim.read(1).unwrap();
    sim.read(2).unwrap();
    sim.read(1).unwrap();
    sim.read(3).unwrap();

    assert_eq!(sim.cache().occupied(), 3);
    assert_eq!(sim.cache().find(3), Some(2));
}

// =============================================================================
// Write-back deferral / write-through immediacy
// =============================================================================

#[test]
fn test_write_back_hits_never_reach_backing_store() {
    let mut sim = Simulator::new(two_slot_config(), WriteBack).unwrap();
    sim.write(5, 1).unwrap();
    for value in 2..50 {
        sim.write(5, value).unwrap();
    }

    let metrics = sim.metrics();
    assert_eq!(metrics.backing_writes, 0);
    assert_eq!(metrics.hits, 48);
    assert_eq!(sim.backing().get(5), Some(0));
    assert_eq!(sim.read(5).unwrap().value, 49);
}

#[test]
fn test_write_through_every_write_commits_once() {
    let mut sim = Simulator::new(two_slot_config(), WriteThrough).unwrap();
    for (n, block_id) in [1, 2, 1, 3, 4, 1, 1].into_iter().enumerate() {
        sim.write(block_id, n as Value).unwrap();
        assert_eq!(sim.metrics().backing_writes, n as u64 + 1);
        assert_eq!(sim.cache().dirty_count(), 0);
    }
    assert_eq!(sim.flush_all(), 0);
}

#[test]
fn test_read_miss_on_clean_victim_under_write_back() {
    let mut sim = Simulator::new(two_slot_config(), WriteBack).unwrap();
    sim.read(1).unwrap();
    sim.read(2).unwrap();
    sim.read(3).unwrap();

    assert_eq!(sim.metrics().backing_writes, 0);
    assert_eq!(sim.metrics().write_latency, 0.0);
}

// =============================================================================
// Block id validation
// =============================================================================

#[test]
fn test_repeated_allocation_keeps_ids_unique() {
    let config = two_slot_config().with_backing_capacity(8);
    let mut sim = Simulator::new(config, engine(WritePolicy::WriteBack)).unwrap();

    sim.read(1).unwrap();
    sim.read(1).unwrap();
    sim.write(1, 5).unwrap();

    assert_eq!(sim.cache().occupied(), 1);
    assert_eq!(sim.metrics().backing_reads, 1);
    assert_table_invariants(&sim);
}

#[test]
fn test_out_of_range_ids_leave_state_unchanged() {
    let config = two_slot_config().with_backing_capacity(8);
    let mut sim = Simulator::new(config, engine(WritePolicy::WriteThrough)).unwrap();
    sim.write(7, 70).unwrap();
    let before = sim.metrics();

    let err = sim.write(8, 1).unwrap_err();
    assert_eq!(
        err,
        SimError::InvalidBlockId {
            block_id: 8,
            capacity: 8
        }
    );
    assert!(sim.read(usize::MAX).is_err());

    assert_eq!(sim.metrics(), before);
    assert_eq!(sim.clock(), 1);
    assert_eq!(sim.backing().get(8), None);
    assert_table_invariants(&sim);
}

#[test]
fn test_zero_slot_cache_is_rejected() {
    let config = SimConfig::new().with_cache_capacity(0);
    assert!(matches!(
        Simulator::new(config, WriteBack),
        Err(SimError::InvalidConfig(_))
    ));
}

// =============================================================================
// Randomized invariants
// =============================================================================

fn random_operations(seed: u64, count: usize, blocks: usize) -> Vec<Operation> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..count)
        .map(|_| match rng.gen_range(0..100) {
            0..=44 => Operation::Read(rng.gen_range(0..blocks)),
            45..=94 => Operation::Write(rng.gen_range(0..blocks), rng.gen_range(1..1000)),
            95..=97 => Operation::FlushAll,
            _ => Operation::Sync,
        })
        .collect()
}

fn check_random_replay<P: WritePolicyEngine>(policy: P, seed: u64) {
    let write_through = policy.policy() == WritePolicy::WriteThrough;
    let config = SimConfig::new()
        .with_cache_capacity(8)
        .with_backing_capacity(64);
    let mut sim = Simulator::new(config, policy).unwrap();
    let mut expected: HashMap<usize, Value> = HashMap::new();
    let mut previous = sim.metrics();

    for operation in random_operations(seed, 2_000, 40) {
        match operation {
            Operation::Read(block_id) => {
                let read = sim.read(block_id).unwrap();
                assert_eq!(read.value, expected.get(&block_id).copied().unwrap_or(0));
            }
            Operation::Write(block_id, value) => {
                sim.write(block_id, value).unwrap();
                expected.insert(block_id, value);
            }
            other => {
                sim.apply(&other).unwrap();
            }
        }

        assert_table_invariants(&sim);
        if write_through {
            assert_eq!(sim.cache().dirty_count(), 0);
        }

        let current = sim.metrics();
        assert!(current.hits >= previous.hits);
        assert!(current.misses >= previous.misses);
        assert!(current.backing_reads >= previous.backing_reads);
        assert!(current.backing_writes >= previous.backing_writes);
        assert!(current.read_latency >= previous.read_latency);
        assert!(current.write_latency >= previous.write_latency);
        previous = current;
    }

    sim.flush_all();
    for (block_id, value) in expected {
        assert_eq!(sim.backing().get(block_id), Some(value));
    }
}

#[test]
fn test_random_replay_write_back() {
    for seed in 0..4 {
        check_random_replay(WriteBack, seed);
    }
}

#[test]
fn test_random_replay_write_through() {
    for seed in 0..4 {
        check_random_replay(WriteThrough, seed);
    }
}

#[test]
fn test_policies_agree_on_hits() {
    let ops = random_operations(42, 1_000, 30);
    let config = SimConfig::new().with_cache_capacity(8);

    let mut back = Simulator::new(config.clone(), WriteBack).unwrap();
    let mut through = Simulator::new(config, WriteThrough).unwrap();
    let back = back.replay(&ops).unwrap();
    let through = through.replay(&ops).unwrap();

    // residency does not depend on the write policy
    assert_eq!(back.hits, through.hits);
    assert_eq!(back.misses, through.misses);
    assert_eq!(back.backing_reads, through.backing_reads);
    assert!(back.backing_writes <= through.backing_writes);
}
