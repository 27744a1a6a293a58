//! Configuration for the simulator bench.
//!
//! Every section is optional; an empty file (or no file at all) runs the four
//! standard workloads under both write policies with the default tier sizes
//! and latencies.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tiersim::{LatencyModel, SimConfig, WritePolicy};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Simulator settings shared by every run.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Which write policies to run: "write-back", "write-through" or "both".
    #[serde(default)]
    pub policy: PolicySelection,
    /// Number of cache slots.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Number of backing store blocks.
    #[serde(default = "default_backing_capacity")]
    pub backing_capacity: usize,
    /// Block size (e.g., "4KB"). Only used when reporting tier sizes.
    #[serde(default = "default_block_size", deserialize_with = "deserialize_size")]
    pub block_size: usize,
    /// Per-access latencies.
    #[serde(default)]
    pub latency: LatencyConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            policy: PolicySelection::default(),
            cache_capacity: default_cache_capacity(),
            backing_capacity: default_backing_capacity(),
            block_size: default_block_size(),
            latency: LatencyConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// Build the simulator configuration.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new()
            .with_cache_capacity(self.cache_capacity)
            .with_backing_capacity(self.backing_capacity)
            .with_block_size(self.block_size)
            .with_latency(self.latency.into())
    }
}

fn default_cache_capacity() -> usize {
    tiersim::DEFAULT_CACHE_CAPACITY
}

fn default_backing_capacity() -> usize {
    tiersim::DEFAULT_BACKING_CAPACITY
}

fn default_block_size() -> usize {
    tiersim::DEFAULT_BLOCK_SIZE
}

/// Per-access latencies, in milliseconds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LatencyConfig {
    pub cache_read: f64,
    pub cache_write: f64,
    pub backing_read: f64,
    pub backing_write: f64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        let model = LatencyModel::default();
        Self {
            cache_read: model.cache_read,
            cache_write: model.cache_write,
            backing_read: model.backing_read,
            backing_write: model.backing_write,
        }
    }
}

impl From<LatencyConfig> for LatencyModel {
    fn from(config: LatencyConfig) -> Self {
        LatencyModel {
            cache_read: config.cache_read,
            cache_write: config.cache_write,
            backing_read: config.backing_read,
            backing_write: config.backing_write,
        }
    }
}

/// Which write policies a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicySelection {
    /// Run every workload under one policy.
    Only(WritePolicy),
    /// Run every workload under both policies and compare them.
    #[default]
    Both,
}

impl PolicySelection {
    /// Policies to run, write-back first.
    pub fn policies(&self) -> Vec<WritePolicy> {
        match self {
            PolicySelection::Only(policy) => vec![*policy],
            PolicySelection::Both => vec![WritePolicy::WriteBack, WritePolicy::WriteThrough],
        }
    }
}

impl FromStr for PolicySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "both" | "all" => Ok(PolicySelection::Both),
            other => other
                .parse::<WritePolicy>()
                .map(PolicySelection::Only)
                .map_err(|_| {
                    format!(
                        "invalid policy '{}', expected: write-back, write-through, both",
                        s
                    )
                }),
        }
    }
}

impl fmt::Display for PolicySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySelection::Only(policy) => write!(f, "{}", policy),
            PolicySelection::Both => write!(f, "both"),
        }
    }
}

impl<'de> Deserialize<'de> for PolicySelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Workload files and generation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadConfig {
    /// Directory holding the workload files.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Regenerate workload files before running.
    #[serde(default)]
    pub generate: bool,
    /// Seed for the workload generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Workloads to run, in order.
    #[serde(default = "default_files", rename = "file")]
    pub files: Vec<WorkloadFile>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            generate: false,
            seed: default_seed(),
            files: default_files(),
        }
    }
}

impl WorkloadConfig {
    /// Location of a workload file.
    pub fn path_of(&self, file: &WorkloadFile) -> PathBuf {
        self.directory.join(&file.path)
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_seed() -> u64 {
    42
}

fn default_files() -> Vec<WorkloadFile> {
    [
        ("Random", "workload_random.txt", Pattern::Random),
        ("Sequential", "workload_sequential.txt", Pattern::Sequential),
        ("Locality", "workload_locality.txt", Pattern::Locality),
        ("Write-Heavy", "workload_write_heavy.txt", Pattern::WriteHeavy),
    ]
    .into_iter()
    .map(|(name, path, pattern)| WorkloadFile {
        name: name.to_string(),
        path: PathBuf::from(path),
        pattern: Some(pattern),
        operations: pattern.default_operations(),
    })
    .collect()
}

/// One workload file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadFile {
    /// Display name.
    pub name: String,
    /// Path relative to the workload directory.
    pub path: PathBuf,
    /// Access pattern used when generating this file. Files without a
    /// pattern are never generated.
    #[serde(default)]
    pub pattern: Option<Pattern>,
    /// Number of operations to generate (excluding the trailing F and S).
    #[serde(default)]
    pub operations: usize,
}

impl WorkloadFile {
    /// Operations to generate, falling back to the pattern default.
    pub fn operation_count(&self) -> usize {
        match (self.operations, self.pattern) {
            (0, Some(pattern)) => pattern.default_operations(),
            (n, _) => n,
        }
    }
}

/// Access pattern of a generated workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// Uniform blocks, half reads.
    Random,
    /// Ascending blocks, mostly reads.
    Sequential,
    /// Hot set of 20 blocks, mostly reads.
    Locality,
    /// Hot set of 20 blocks, mostly writes.
    WriteHeavy,
}

impl Pattern {
    /// Operation count used when a file does not set one.
    pub fn default_operations(&self) -> usize {
        match self {
            Pattern::Sequential => 150,
            Pattern::Random | Pattern::Locality | Pattern::WriteHeavy => 100,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Random => write!(f, "random"),
            Pattern::Sequential => write!(f, "sequential"),
            Pattern::Locality => write!(f, "locality"),
            Pattern::WriteHeavy => write!(f, "write-heavy"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level or filter directive. RUST_LOG takes precedence.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Log format: "pretty", "compact" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulator
            .sim_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.workload.files.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[workload.file]] is required".to_string(),
            ));
        }
        if let Some(file) = self.workload.files.iter().find(|f| f.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "workload file '{}' has an empty name",
                file.path.display()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Deserialize a size from a human-readable string (e.g., "4KB", "512B").
fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeValue {
        Bytes(usize),
        String(String),
    }

    match SizeValue::deserialize(deserializer)? {
        SizeValue::Bytes(bytes) => Ok(bytes),
        SizeValue::String(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a size string like "4KB", "1MB" or "512" into bytes.
fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".to_string());
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());

    let (num_str, suffix) = s.split_at(num_end);
    let num: f64 = num_str
        .parse()
        .map_err(|e| format!("invalid number '{}': {}", num_str, e))?;

    let multiplier: usize = match suffix.trim().to_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size suffix '{}'", other)),
    };

    Ok((num * multiplier as f64) as usize)
}
