//! Error types for simulator operations.

use crate::BlockId;

/// Errors that can occur while configuring or driving a simulator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// The block id is outside the backing store.
    ///
    /// Rejected before the logical clock advances, so the simulator state
    /// is unchanged.
    #[error("invalid block id {block_id} (backing store holds {capacity} blocks)")]
    InvalidBlockId {
        /// The offending block id.
        block_id: BlockId,
        /// Number of blocks in the backing store.
        capacity: usize,
    },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for simulator operations.
pub type SimResult<T> = Result<T, SimError>;
