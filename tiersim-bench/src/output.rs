//! Report formatting.
//!
//! Each report is rendered to a `String` first so the layout can be tested;
//! the `print_*` wrappers write it to stdout.

use crate::config::Config;
use crate::runner::RunResult;
use std::fmt::Write;
use tiersim::{MetricsSnapshot, WritePolicy};

const LABEL_WIDTH: usize = 18;
const COLUMN_WIDTH: usize = 14;

pub fn print_config(config: &Config, policies: &[WritePolicy]) {
    eprint!("{}", render_config(config, policies));
}

pub fn print_statistics(result: &RunResult) {
    print!("{}", render_statistics(result));
}

pub fn print_comparison(policy: WritePolicy, results: &[&RunResult]) {
    print!("{}", render_comparison(policy, results));
}

pub fn print_policy_comparison(pairs: &[(&RunResult, &RunResult)]) {
    print!("{}", render_policy_comparison(pairs));
}

fn render_config(config: &Config, policies: &[WritePolicy]) -> String {
    let sim = &config.simulator;
    let latency = &sim.latency;
    let sizes = sim.sim_config();
    let policies: Vec<String> = policies.iter().map(|p| p.to_string()).collect();

    let mut out = String::new();
    let _ = writeln!(out, "tiersim-bench configuration:");
    let _ = writeln!(out, "  policies:   {}", policies.join(", "));
    let _ = writeln!(
        out,
        "  cache:      {} blocks ({})",
        format_count(sim.cache_capacity as u64),
        format_bytes(sizes.cache_bytes() as u64)
    );
    let _ = writeln!(
        out,
        "  backing:    {} blocks ({})",
        format_count(sim.backing_capacity as u64),
        format_bytes(sizes.backing_bytes() as u64)
    );
    let _ = writeln!(out, "  block size: {}", format_bytes(sim.block_size as u64));
    let _ = writeln!(
        out,
        "  latency:    cache r/w={}/{} ms  backing r/w={}/{} ms",
        latency.cache_read, latency.cache_write, latency.backing_read, latency.backing_write
    );
    let _ = writeln!(out, "  workloads:  {}", config.workload.directory.display());
    for file in &config.workload.files {
        let _ = writeln!(out, "    {:<14} {}", file.name, file.path.display());
    }
    let _ = writeln!(out);
    out
}

fn render_statistics(result: &RunResult) -> String {
    let s = &result.snapshot;
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ({}) ===", result.name, result.policy);
    let _ = writeln!(out, "  operations:     {}", format_count(result.operations as u64));
    let _ = writeln!(out, "  hit rate:       {}%", format_pct(s.hit_rate()));
    let _ = writeln!(out, "  miss rate:      {}%", format_pct(s.miss_rate()));
    let _ = writeln!(out, "  backing reads:  {}", format_count(s.backing_reads));
    let _ = writeln!(out, "  backing writes: {}", format_count(s.backing_writes));
    let _ = writeln!(out, "  read time:      {}", format_ms(s.read_latency));
    let _ = writeln!(out, "  write time:     {}", format_ms(s.write_latency));
    let _ = writeln!(out, "  total time:     {}", format_ms(s.total_latency()));
    let _ = writeln!(
        out,
        "  latency (us):   p50={:.1}  p99={:.1}  max={:.1}",
        result.latency.p50, result.latency.p99, result.latency.max
    );
    let _ = writeln!(out);
    out
}

type Row = (&'static str, fn(&MetricsSnapshot) -> String);

const COMPARISON_ROWS: [Row; 7] = [
    ("Hit Rate", |s| format!("{}%", format_pct(s.hit_rate()))),
    ("Miss Rate", |s| format!("{}%", format_pct(s.miss_rate()))),
    ("Backing Reads", |s| format_count(s.backing_reads)),
    ("Backing Writes", |s| format_count(s.backing_writes)),
    ("Read Time", |s| format_ms(s.read_latency)),
    ("Write Time", |s| format_ms(s.write_latency)),
    ("Total Time", |s| format_ms(s.total_latency())),
];

fn render_comparison(policy: WritePolicy, results: &[&RunResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Workload Comparison ({}) ===", policy);

    let _ = write!(out, "{:<width$}", "Metric", width = LABEL_WIDTH);
    for result in results {
        let _ = write!(out, "{:>width$}", result.name, width = COLUMN_WIDTH);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "-".repeat(LABEL_WIDTH + COLUMN_WIDTH * results.len()));

    for (label, render) in COMPARISON_ROWS {
        let _ = write!(out, "{:<width$}", label, width = LABEL_WIDTH);
        for result in results {
            let _ = write!(out, "{:>width$}", render(&result.snapshot), width = COLUMN_WIDTH);
        }
        let _ = writeln!(out);
    }
    let _ = writeln!(out);
    out
}

fn render_policy_comparison(pairs: &[(&RunResult, &RunResult)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Write-Back vs Write-Through ===");
    let _ = writeln!(
        out,
        "{:<14} {:>12} {:>12} {:>9} {:>10} {:>10}",
        "Workload", "WB Time", "WT Time", "Speedup", "WB Writes", "WT Writes"
    );
    let _ = writeln!(out, "{}", "-".repeat(72));

    for (back, through) in pairs {
        let back_total = back.snapshot.total_latency();
        let through_total = through.snapshot.total_latency();
        let speedup = if back_total > 0.0 {
            format!("{:.2}x", through_total / back_total)
        } else {
            "-".to_string()
        };
        let _ = writeln!(
            out,
            "{:<14} {:>12} {:>12} {:>9} {:>10} {:>10}",
            back.name,
            format_ms(back_total),
            format_ms(through_total),
            speedup,
            format_count(back.snapshot.backing_writes),
            format_count(through.snapshot.backing_writes),
        );
    }
    let _ = writeln!(out);
    out
}

/// Format simulated milliseconds with two decimals.
pub fn format_ms(ms: f64) -> String {
    format!("{:.2} ms", ms)
}

/// Format a percentage with two decimals.
pub fn format_pct(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format a count with thousands separators (e.g., "10,000").
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format a byte count with binary suffixes.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
