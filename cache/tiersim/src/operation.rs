//! Operations replayed through a simulator.

use crate::{BlockId, Value};
use std::fmt;

/// One entry of an operation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read a block.
    Read(BlockId),
    /// Write a value to a block.
    Write(BlockId, Value),
    /// Flush every dirty slot. A no-op under write-through.
    FlushAll,
    /// Ordering marker with no effect on state.
    Sync,
}

impl Operation {
    /// Block targeted by the operation, if any.
    pub fn block_id(&self) -> Option<BlockId> {
        match self {
            Operation::Read(id) | Operation::Write(id, _) => Some(*id),
            Operation::FlushAll | Operation::Sync => None,
        }
    }

    /// Whether the operation reads or writes a block.
    pub fn is_access(&self) -> bool {
        self.block_id().is_some()
    }
}

/// Formats as a workload file line (`R 1`, `W 1 100`, `F`, `S`).
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read(id) => write!(f, "R {}", id),
            Operation::Write(id, value) => write!(f, "W {} {}", id, value),
            Operation::FlushAll => write!(f, "F"),
            Operation::Sync => write!(f, "S"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Operation::Read(12).to_string(), "R 12");
        assert_eq!(Operation::Write(3, -7).to_string(), "W 3 -7");
        assert_eq!(Operation::FlushAll.to_string(), "F");
        assert_eq!(Operation::Sync.to_string(), "S");
    }

    #[test]
    fn test_block_id() {
        assert_eq!(Operation::Read(4).block_id(), Some(4));
        assert_eq!(Operation::Write(5, 1).block_id(), Some(5));
        assert_eq!(Operation::FlushAll.block_id(), None);
        assert!(!Operation::Sync.is_access());
        assert!(Operation::Read(0).is_access());
    }
}
