//! Workload files.
//!
//! A workload file is line oriented:
//!
//! ```text
//! # comment
//! R <block>
//! W <block> [value]
//! F
//! S
//! ```
//!
//! Blank lines and `#` comments are skipped. Unknown tokens are ignored, and
//! lines with malformed numbers are skipped with a warning, so the simulator
//! only ever sees well-formed operations.
//!
//! A negative block id is well formed but out of range, the same as an id
//! past the end of the backing store. Both fail the workload: negative ids
//! when the file is parsed, too-large ids when the simulator rejects them.

use crate::config::Pattern;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::io;
use std::path::{Path, PathBuf};
use tiersim::{BlockId, Operation, Value};
use tracing::warn;

/// Highest block id touched by the random and locality patterns.
const MAX_RANDOM_BLOCK: BlockId = 200;

/// Values written by generated workloads are drawn from `1..=MAX_VALUE`.
const MAX_VALUE: Value = 1000;

#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("workload file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("line {line}: invalid block id {block_id}")]
    InvalidBlockId { line: usize, block_id: i64 },
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

enum LineError {
    Malformed(String),
    Negative(i64),
}

impl From<String> for LineError {
    fn from(reason: String) -> Self {
        LineError::Malformed(reason)
    }
}

/// Parse the contents of a workload file.
///
/// Fails only on a negative block id.
pub fn parse(contents: &str) -> Result<Vec<Operation>, WorkloadError> {
    let mut operations = Vec::new();

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(Some(operation)) => operations.push(operation),
            Ok(None) => {}
            Err(LineError::Malformed(reason)) => {
                warn!(line = number + 1, %reason, "skipping malformed workload line")
            }
            Err(LineError::Negative(block_id)) => {
                return Err(WorkloadError::InvalidBlockId {
                    line: number + 1,
                    block_id,
                });
            }
        }
    }

    Ok(operations)
}

fn parse_line(line: &str) -> Result<Option<Operation>, LineError> {
    let mut parts = line.split_whitespace();
    let op = match parts.next() {
        Some(op) => op.to_uppercase(),
        None => return Ok(None),
    };

    let operation = match op.as_str() {
        "R" => Operation::Read(parse_block(parts.next())?),
        "W" => {
            let block_id = parse_block(parts.next())?;
            let value = match parts.next() {
                Some(value) => value
                    .parse::<Value>()
                    .map_err(|e| format!("invalid value '{}': {}", value, e))?,
                None => 0,
            };
            Operation::Write(block_id, value)
        }
        "F" => Operation::FlushAll,
        "S" => Operation::Sync,
        _ => return Ok(None),
    };

    Ok(Some(operation))
}

fn parse_block(token: Option<&str>) -> Result<BlockId, LineError> {
    let token = token.ok_or_else(|| "missing block id".to_string())?;
    match token.parse::<BlockId>() {
        Ok(block_id) => Ok(block_id),
        Err(e) => match token.parse::<i64>() {
            Ok(block_id) if block_id < 0 => Err(LineError::Negative(block_id)),
            _ => Err(LineError::Malformed(format!(
                "invalid block id '{}': {}",
                token, e
            ))),
        },
    }
}

/// Read and parse a workload file.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn load(path: &Path) -> Result<Vec<Operation>, WorkloadError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            WorkloadError::NotFound(path.to_path_buf())
        } else {
            WorkloadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    parse(&String::from_utf8_lossy(&bytes))
}

/// Generate `count` operations with the given access pattern.
///
/// The result always ends with a flush followed by a sync marker.
pub fn generate(pattern: Pattern, count: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<Operation> {
    let hot: Vec<BlockId> = (10..110).step_by(5).collect();
    let mut operations = Vec::with_capacity(count + 2);

    for i in 0..count {
        let operation = match pattern {
            Pattern::Random => {
                let read = rng.gen_bool(0.5);
                let block_id = rng.gen_range(0..=MAX_RANDOM_BLOCK);
                access(rng, read, block_id)
            }
            Pattern::Sequential => {
                let read = rng.gen_bool(0.75);
                access(rng, read, i)
            }
            Pattern::Locality | Pattern::WriteHeavy => {
                let block_id = if rng.gen_bool(0.8) {
                    hot[rng.gen_range(0..hot.len())]
                } else {
                    rng.gen_range(0..=MAX_RANDOM_BLOCK)
                };
                let read_ratio = if pattern == Pattern::Locality { 0.67 } else { 0.3 };
                let read = rng.gen_bool(read_ratio);
                access(rng, read, block_id)
            }
        };
        operations.push(operation);
    }

    operations.push(Operation::FlushAll);
    operations.push(Operation::Sync);
    operations
}

fn access(rng: &mut Xoshiro256PlusPlus, read: bool, block_id: BlockId) -> Operation {
    if read {
        Operation::Read(block_id)
    } else {
        Operation::Write(block_id, rng.gen_range(1..=MAX_VALUE))
    }
}

/// Render operations as workload file contents with a header comment.
pub fn render(name: &str, operations: &[Operation]) -> String {
    let mut out = format!("# {} Workload\n", name);
    for operation in operations {
        out.push_str(&operation.to_string());
        out.push('\n');
    }
    out
}

/// Write a workload file, creating parent directories as needed.
pub fn save(path: &Path, name: &str, operations: &[Operation]) -> Result<(), WorkloadError> {
    let io_error = |source| WorkloadError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, render(name, operations)).map_err(io_error)
}
