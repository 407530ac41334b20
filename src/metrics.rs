use crate::utils::{calculate_stats, percentile_of_sorted};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Statistics could not be computed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("no latencies to calculate statistics from")]
    InsufficientData,
}

/// Percentile value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value_ns: f64,
}

/// Latency distribution of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min_ns: f64,
    pub max_ns: f64,
    pub mean_ns: f64,
    pub std_dev_ns: f64,
    pub percentiles: Vec<PercentileValue>,
    pub total_samples: usize,
}

impl LatencyStats {
    /// Compute statistics over every sample, successful and failed alike
    ///
    /// Percentiles are linearly interpolated over the sorted samples.
    pub fn from_samples(samples: &[Duration], percentiles: &[f64]) -> Result<Self, StatsError> {
        if samples.is_empty() {
            return Err(StatsError::InsufficientData);
        }

        let mut values: Vec<f64> = samples.iter().map(|d| d.as_nanos() as f64).collect();
        values.sort_by(f64::total_cmp);

        let (mean, min, max, std_dev) = calculate_stats(&values);

        let percentiles = percentiles
            .iter()
            .map(|&p| PercentileValue {
                percentile: p,
                value_ns: percentile_of_sorted(&values, p),
            })
            .collect();

        Ok(Self {
            min_ns: min,
            max_ns: max,
            // Summation rounding must not push the mean outside the sample range
            mean_ns: mean.clamp(min, max),
            std_dev_ns: std_dev,
            percentiles,
            total_samples: values.len(),
        })
    }

    pub fn min(&self) -> Duration {
        nanos_to_duration(self.min_ns)
    }

    pub fn max(&self) -> Duration {
        nanos_to_duration(self.max_ns)
    }

    pub fn mean(&self) -> Duration {
        nanos_to_duration(self.mean_ns)
    }

    pub fn std_dev(&self) -> Duration {
        nanos_to_duration(self.std_dev_ns)
    }

    /// Value at a percentile that was requested when the stats were computed
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        self.percentiles
            .iter()
            .find(|p| (p.percentile - percentile).abs() < 1e-9)
            .map(|p| nanos_to_duration(p.value_ns))
    }
}

/// Append-only latency sample sequence
///
/// Owned by the aggregator, which is its only writer; read once when the run
/// has drained.
#[derive(Debug, Default)]
pub struct LatencySamples {
    samples: Vec<Duration>,
}

impl LatencySamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn stats(&self, percentiles: &[f64]) -> Result<LatencyStats, StatsError> {
        LatencyStats::from_samples(&self.samples, percentiles)
    }
}

fn nanos_to_duration(nanos: f64) -> Duration {
    Duration::from_nanos(nanos.max(0.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const DEFAULT_PERCENTILES: [f64; 4] = [50.0, 95.0, 99.0, 99.9];

    #[test]
    fn test_empty_samples_are_insufficient() {
        assert_eq!(
            LatencySamples::new().stats(&DEFAULT_PERCENTILES),
            Err(StatsError::InsufficientData)
        );
    }

    #[test]
    fn test_basic_stats() {
        let mut samples = LatencySamples::new();
        for ms in [5, 1, 3, 2, 4] {
            samples.record(Duration::from_millis(ms));
        }
        assert_eq!(samples.len(), 5);

        let stats = samples.stats(&DEFAULT_PERCENTILES).unwrap();
        assert_eq!(stats.total_samples, 5);
        assert_eq!(stats.min(), Duration::from_millis(1));
        assert_eq!(stats.max(), Duration::from_millis(5));
        assert_eq!(stats.mean(), Duration::from_millis(3));
        assert_eq!(stats.percentile(50.0), Some(Duration::from_millis(3)));
        // Rank 0.95 * 4 = 3.8 interpolates between 4ms and 5ms
        assert_eq!(stats.percentile(95.0), Some(Duration::from_micros(4800)));
        assert_eq!(stats.percentile(42.0), None);
    }

    #[test]
    fn test_single_sample() {
        let stats =
            LatencyStats::from_samples(&[Duration::from_micros(750)], &DEFAULT_PERCENTILES)
                .unwrap();
        for p in DEFAULT_PERCENTILES {
            assert_eq!(stats.percentile(p), Some(Duration::from_micros(750)));
        }
        assert_eq!(stats.std_dev(), Duration::ZERO);
    }

    #[test]
    fn test_percentiles_are_monotonic() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let len = rng.gen_range(1..500);
            let samples: Vec<Duration> = (0..len)
                .map(|_| Duration::from_nanos(rng.gen_range(1..50_000_000)))
                .collect();

            let stats = LatencyStats::from_samples(&samples, &DEFAULT_PERCENTILES).unwrap();
            let values: Vec<f64> = stats.percentiles.iter().map(|p| p.value_ns).collect();

            assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
            assert!(values[values.len() - 1] <= stats.max_ns);
            assert!(stats.min_ns <= values[0]);
            assert!(stats.min_ns <= stats.mean_ns && stats.mean_ns <= stats.max_ns);
        }
    }

    #[test]
    fn test_identical_samples_keep_mean_in_range() {
        let samples = vec![Duration::from_nanos(333_333_333); 7];
        let stats = LatencyStats::from_samples(&samples, &DEFAULT_PERCENTILES).unwrap();
        assert!(stats.min_ns <= stats.mean_ns && stats.mean_ns <= stats.max_ns);
        assert_eq!(stats.mean(), Duration::from_nanos(333_333_333));
    }
}
