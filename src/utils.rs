//! # Utility Functions and Helper Module
//!
//! Formatters for human-readable output and the numerical helpers the stats
//! calculator is built on.
//!
//! ## Usage Examples
//!
//! ```rust
//! use cmdbench::utils::*;
//! use std::time::Duration;
//!
//! assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
//! assert_eq!(format_ops_rate(1500.0), "1.50K ops/s");
//!
//! let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//! assert_eq!(percentile_of_sorted(&values, 50.0), 3.0);
//! ```

use std::time::Duration;

/// Format a nanosecond count in a human-readable way
///
/// ```rust
/// # use cmdbench::utils::format_duration_ns;
/// assert_eq!(format_duration_ns(500), "500ns");
/// assert_eq!(format_duration_ns(1500), "1.50μs");
/// assert_eq!(format_duration_ns(1500000), "1.50ms");
/// ```
pub fn format_duration_ns(ns: u64) -> String {
    format_duration(Duration::from_nanos(ns))
}

/// Format a duration in a human-readable way
///
/// Selects the unit from the magnitude:
///
/// - **Nanoseconds**: < 1,000 ns (e.g., "500ns")
/// - **Microseconds**: < 1,000,000 ns (e.g., "1.50μs")
/// - **Milliseconds**: < 1,000,000,000 ns (e.g., "25.75ms")
/// - **Seconds**: < 60 seconds (e.g., "5.25s")
/// - **Minutes and Hours**: for longer durations (e.g., "5m 30s", "2h 15m 30s")
///
/// ```rust
/// # use cmdbench::utils::format_duration;
/// # use std::time::Duration;
/// assert_eq!(format_duration(Duration::from_nanos(750)), "750ns");
/// assert_eq!(format_duration(Duration::from_nanos(1250)), "1.25μs");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Format an operation rate with decimal scaling
///
/// ```rust
/// # use cmdbench::utils::format_ops_rate;
/// assert_eq!(format_ops_rate(750.0), "750.00 ops/s");
/// assert_eq!(format_ops_rate(15500.0), "15.50K ops/s");
/// assert_eq!(format_ops_rate(2300000.0), "2.30M ops/s");
/// ```
pub fn format_ops_rate(ops_per_second: f64) -> String {
    if ops_per_second < 1000.0 {
        format!("{:.2} ops/s", ops_per_second)
    } else if ops_per_second < 1_000_000.0 {
        format!("{:.2}K ops/s", ops_per_second / 1000.0)
    } else {
        format!("{:.2}M ops/s", ops_per_second / 1_000_000.0)
    }
}

/// Operations per second over an elapsed interval, 0 for an empty interval
pub fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

/// Calculate statistics from a slice of values
///
/// Returns `(mean, min, max, standard_deviation)` using the population
/// standard deviation σ = √(Σ(x - μ)² / N). An empty slice yields all zeros.
///
/// ```rust
/// # use cmdbench::utils::calculate_stats;
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let (mean, min, max, std_dev) = calculate_stats(&values);
/// assert_eq!(mean, 3.0);
/// assert_eq!(min, 1.0);
/// assert_eq!(max, 5.0);
/// // std_dev ≈ 1.414
/// ```
pub fn calculate_stats(values: &[f64]) -> (f64, f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }

    let sum: f64 = values.iter().sum();
    let count = values.len() as f64;
    let mean = sum / count;

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
    let std_dev = variance.sqrt();

    (mean, min, max, std_dev)
}

/// Percentile of an already sorted slice, by linear interpolation
///
/// For percentile P over N values the fractional rank is `(P/100) * (N-1)`;
/// a fractional rank interpolates between its two neighbouring values. The
/// rank is clamped to `[0, N-1]`, and an empty slice yields 0.0.
///
/// ```rust
/// # use cmdbench::utils::percentile_of_sorted;
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(percentile_of_sorted(&values, 95.0), 4.8);
/// ```
pub fn percentile_of_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let last = sorted_values.len() - 1;
    let index = ((percentile / 100.0) * last as f64).clamp(0.0, last as f64);
    let lower_index = index.floor() as usize;
    let upper_index = index.ceil() as usize;

    if lower_index == upper_index {
        sorted_values[lower_index]
    } else {
        let lower_value = sorted_values[lower_index];
        let upper_value = sorted_values[upper_index];
        let weight = index - lower_index as f64;
        lower_value + weight * (upper_value - lower_value)
    }
}
