//! tiersim: a two-tier storage simulator.
//!
//! A small fast cache (think SSD) sits in front of a large slow backing store
//! (think HDD). The simulator replays read/write operations against both
//! tiers and accounts hits, misses, backing store traffic and simulated
//! latency, so write policies can be compared under the same workload.
//!
//! - **BackingStore**: Durable array of blocks holding the authoritative values
//! - **CacheTable**: Fixed array of slots, each caching one block
//! - **Eviction**: LRU victim selection, empty slots first
//! - **Write policies**: `WriteBack` (dirty bit, deferred flush) and
//!   `WriteThrough` (immediate commit)
//! - **Simulator**: Owns the tiers, drives the logical clock, dispatches operations
//! - **Metrics**: Counters and latency totals with derived rates
//!
//! # Architecture
//!
//! ```text
//!        Operation stream (R / W / F / S)
//!                     |
//!                     v
//!             +---------------+        +-------------------+
//!             |   Simulator   | -----> | WritePolicyEngine |
//!             | (clock, read) |        |  WriteBack        |
//!             +-------+-------+        |  WriteThrough     |
//!                     |                +---------+---------+
//!                     v                          |
//!   +---------------------------------------------------------+
//!   | Tiers                                                   |
//!   |  +------------+  LRU evict / flush  +----------------+  |
//!   |  | CacheTable | ------------------> |  BackingStore  |  |
//!   |  +------------+ <------------------ +----------------+  |
//!   |                    allocate (load)                      |
//!   |  MetricsRecorder                                        |
//!   +---------------------------------------------------------+
//! ```
//!
//! # Example
//!
//! ```
//! use tiersim::{Operation, SimConfig, Simulator, WriteBack};
//!
//! let config = SimConfig::new().with_cache_capacity(2);
//! let mut sim = Simulator::new(config, WriteBack).unwrap();
//!
//! sim.write(1, 100).unwrap();
//! assert_eq!(sim.read(1).unwrap().value, 100);
//!
//! // nothing reaches the backing store until a flush
//! assert_eq!(sim.backing().get(1), Some(0));
//! sim.apply(&Operation::FlushAll).unwrap();
//! assert_eq!(sim.backing().get(1), Some(100));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod eviction;
mod metrics;
mod operation;
mod policy;
mod simulator;
mod store;
mod table;
mod tiers;

/// Identifier of a block, shared by both tiers.
pub type BlockId = usize;

/// Contents of a block.
pub type Value = i64;

pub use config::{
    DEFAULT_BACKING_CAPACITY, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY, LatencyModel,
    SimConfig, WritePolicy,
};
pub use error::{SimError, SimResult};
pub use eviction::select_victim;
pub use metrics::{MetricsRecorder, MetricsSnapshot};
pub use operation::Operation;
pub use policy::{WriteBack, WritePolicyEngine, WriteThrough, engine};
pub use simulator::{DynSimulator, LogicalClock, ReadResult, Simulator};
pub use store::BackingStore;
pub use table::{CacheSlot, CacheTable};
pub use tiers::Tiers;
