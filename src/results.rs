use crate::{
    coordination::{CounterSnapshot, StopReason},
    metrics::{LatencyStats, StatsError},
    utils::{format_duration, format_duration_ns, format_ops_rate, rate},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final results of one benchmark run
///
/// Derived once the run has stopped and every result has been drained; never
/// modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub command: String,
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub elapsed: Duration,
    /// Successful operations per second of wall-clock time
    pub ops_per_second: f64,
    /// All collected operations per second, failures included
    pub collected_per_second: f64,
    pub stop_reason: Option<StopReason>,
    /// `None` when no samples were collected
    pub latency: Option<LatencyStats>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

impl BenchmarkReport {
    pub fn new(
        command: impl Into<String>,
        counters: CounterSnapshot,
        elapsed: Duration,
        stop_reason: Option<StopReason>,
        latency: Result<LatencyStats, StatsError>,
    ) -> Self {
        Self {
            command: command.into(),
            total_operations: counters.collected,
            successful_operations: counters.successful,
            failed_operations: counters.failed,
            elapsed,
            ops_per_second: rate(counters.successful, elapsed),
            collected_per_second: rate(counters.collected, elapsed),
            stop_reason,
            latency: latency.ok(),
            timestamp: chrono::Utc::now(),
            version: crate::VERSION.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Final Summary ---")?;
        writeln!(f, "Total operations attempted: {}", self.total_operations)?;
        writeln!(f, "Successful operations: {}", self.successful_operations)?;
        writeln!(f, "Failed operations: {}", self.failed_operations)?;
        writeln!(f, "Total time taken: {}", format_duration(self.elapsed))?;
        if let Some(reason) = self.stop_reason {
            writeln!(f, "Stopped because: {}", reason)?;
        }
        writeln!(
            f,
            "Overall Ops/Second (successful): {}",
            format_ops_rate(self.ops_per_second)
        )?;
        writeln!(
            f,
            "Collected Ops/Second (all): {}",
            format_ops_rate(self.collected_per_second)
        )?;

        match &self.latency {
            Some(latency) => {
                writeln!(f, "\n--- Latency Statistics ---")?;
                writeln!(f, "  Min: {}", format_duration(latency.min()))?;
                writeln!(f, "  Max: {}", format_duration(latency.max()))?;
                writeln!(f, "  Mean: {}", format_duration(latency.mean()))?;
                writeln!(f, "  Std Dev: {}", format_duration(latency.std_dev()))?;
                for p in &latency.percentiles {
                    let label = if p.percentile == 50.0 {
                        "P50 (Median)".to_string()
                    } else {
                        format!("P{}", p.percentile)
                    };
                    writeln!(
                        f,
                        "  {}: {}",
                        label,
                        format_duration_ns(p.value_ns.max(0.0).round() as u64)
                    )?;
                }
            }
            None => writeln!(f, "\nNo latency data collected.")?,
        }

        write!(f, "---------------------------")
    }
}
