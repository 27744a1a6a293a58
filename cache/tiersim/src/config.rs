//! Configuration types for the simulator.
//!
//! A [`SimConfig`] is fixed when a [`crate::Simulator`] is constructed. Each
//! simulator owns its own copy, so differently configured instances can
//! coexist.

use crate::error::{SimError, SimResult};
use std::fmt;
use std::str::FromStr;

/// Default number of cache slots.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Default number of blocks in the backing store.
pub const DEFAULT_BACKING_CAPACITY: usize = 10_000;

/// Default block size in bytes. Only used to report tier sizes.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Write policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritePolicy {
    /// Writes stay in the cache and are marked dirty. The backing store is
    /// only updated when a dirty slot is flushed.
    #[default]
    WriteBack,
    /// Every write is committed to the backing store immediately.
    WriteThrough,
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePolicy::WriteBack => write!(f, "write-back"),
            WritePolicy::WriteThrough => write!(f, "write-through"),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "write-back" | "writeback" | "write_back" | "wb" => Ok(WritePolicy::WriteBack),
            "write-through" | "writethrough" | "write_through" | "wt" => {
                Ok(WritePolicy::WriteThrough)
            }
            _ => Err(format!(
                "invalid write policy '{}', expected: write-back, write-through",
                s
            )),
        }
    }
}

/// Simulated per-access cost of each tier, in time units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyModel {
    /// Cost of reading a cache slot.
    pub cache_read: f64,
    /// Cost of writing a cache slot.
    pub cache_write: f64,
    /// Cost of reading a backing store block.
    pub backing_read: f64,
    /// Cost of writing a backing store block.
    pub backing_write: f64,
}

impl Default for LatencyModel {
    fn default() -> Self {
        Self {
            cache_read: 0.1,
            cache_write: 0.2,
            backing_read: 8.0,
            backing_write: 10.0,
        }
    }
}

impl LatencyModel {
    fn validate(&self) -> SimResult<()> {
        let fields = [
            ("cache_read", self.cache_read),
            ("cache_write", self.cache_write),
            ("backing_read", self.backing_read),
            ("backing_write", self.backing_write),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "{} latency must be a non-negative finite number (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Simulator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Number of cache slots.
    pub cache_capacity: usize,
    /// Number of blocks in the backing store.
    pub backing_capacity: usize,
    /// Block size in bytes. Informational; blocks are never partially
    /// addressed.
    pub block_size: usize,
    /// Per-access latency of both tiers.
    pub latency: LatencyModel,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            backing_capacity: DEFAULT_BACKING_CAPACITY,
            block_size: DEFAULT_BLOCK_SIZE,
            latency: LatencyModel::default(),
        }
    }
}

impl SimConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of cache slots.
    pub fn with_cache_capacity(mut self, slots: usize) -> Self {
        self.cache_capacity = slots;
        self
    }

    /// Set the number of backing store blocks.
    pub fn with_backing_capacity(mut self, blocks: usize) -> Self {
        self.backing_capacity = blocks;
        self
    }

    /// Set the block size used for reporting.
    pub fn with_block_size(mut self, bytes: usize) -> Self {
        self.block_size = bytes;
        self
    }

    /// Set the latency model.
    pub fn with_latency(mut self, latency: LatencyModel) -> Self {
        self.latency = latency;
        self
    }

    /// Size of the cache tier in bytes.
    pub fn cache_bytes(&self) -> usize {
        self.cache_capacity.saturating_mul(self.block_size)
    }

    /// Size of the backing tier in bytes.
    pub fn backing_bytes(&self) -> usize {
        self.backing_capacity.saturating_mul(self.block_size)
    }

    /// Check that the configuration describes a usable simulator.
    pub fn validate(&self) -> SimResult<()> {
        if self.cache_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "cache capacity must be non-zero".to_string(),
            ));
        }
        if self.backing_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "backing store capacity must be non-zero".to_string(),
            ));
        }
        self.latency.validate()
    }
}
