//! The durable tier.
//!
//! A [`BackingStore`] holds the authoritative value of every block. Block ids
//! are dense, so the store is a flat array indexed by id.

use crate::error::{SimError, SimResult};
use crate::{BlockId, Value};

/// Fixed-size array of blocks, each initialised to zero.
#[derive(Debug, Clone)]
pub struct BackingStore {
    blocks: Vec<Value>,
}

impl BackingStore {
    /// Create a store holding `capacity` zeroed blocks.
    pub fn new(capacity: usize) -> Self {
        Self {
            blocks: vec![0; capacity],
        }
    }

    /// Number of blocks in the store.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }

    /// Ensure `block_id` addresses a block of this store.
    #[inline]
    pub fn check(&self, block_id: BlockId) -> SimResult<()> {
        if block_id < self.blocks.len() {
            Ok(())
        } else {
            Err(SimError::InvalidBlockId {
                block_id,
                capacity: self.blocks.len(),
            })
        }
    }

    /// Value of a block, or `None` if the id is out of range.
    #[inline]
    pub fn get(&self, block_id: BlockId) -> Option<Value> {
        self.blocks.get(block_id).copied()
    }

    /// Read a block the caller has already checked.
    #[inline]
    pub(crate) fn read(&self, block_id: BlockId) -> Value {
        self.blocks[block_id]
    }

    /// Overwrite a block the caller has already checked.
    #[inline]
    pub(crate) fn write(&mut self, block_id: BlockId, value: Value) {
        self.blocks[block_id] = value;
    }
}
