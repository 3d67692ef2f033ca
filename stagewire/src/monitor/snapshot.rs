//! Point-in-time metric views and percentile math.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latency percentiles over the retained samples of one key, in seconds.
///
/// All fields are `0.0` when no sample is retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Median.
    pub p50: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile.
    pub p99: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Number of retained samples the figures were computed from.
    pub samples: usize,
}

impl LatencySummary {
    /// Computes the summary from unsorted samples.
    #[must_use]
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a f64>) -> Self {
        let mut sorted: Vec<f64> = samples.into_iter().copied().collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        #[allow(clippy::cast_precision_loss)]
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Self {
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
            mean,
            samples: sorted.len(),
        }
    }
}

/// Returns the value at `floor(len * p)` of an ascending slice.
///
/// The index is clamped to the last element; an empty slice yields `0.0`.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let index = (sorted.len() as f64 * p.clamp(0.0, 1.0)).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Metrics for one `"stage.operation"` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageMetrics {
    /// Successful invocations in the window.
    pub success_count: u64,
    /// Failed invocations in the window.
    pub error_count: u64,
    /// Latency over the retained samples.
    pub latency: LatencySummary,
    /// Failures by error kind.
    #[serde(default)]
    pub error_kinds: BTreeMap<String, u64>,
}

/// An immutable read of the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Start of the reporting window (last reset or creation).
    pub window_started_at: DateTime<Utc>,
    /// Metrics per `"stage.operation"` key.
    pub stages: BTreeMap<String, StageMetrics>,
}

impl MetricsSnapshot {
    /// Returns the metrics for one key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StageMetrics> {
        self.stages.get(key)
    }

    /// Returns the success count for a key, 0 if absent.
    #[must_use]
    pub fn success_count(&self, key: &str) -> u64 {
        self.get(key).map_or(0, |m| m.success_count)
    }

    /// Returns the error count for a key, 0 if absent.
    #[must_use]
    pub fn error_count(&self, key: &str) -> u64 {
        self.get(key).map_or(0, |m| m.error_count)
    }

    /// Returns the summed success count over all keys.
    #[must_use]
    pub fn total_successes(&self) -> u64 {
        self.stages.values().map(|m| m.success_count).sum()
    }

    /// Returns the summed error count over all keys.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.stages.values().map(|m| m.error_count).sum()
    }

    /// Returns true if no key recorded any data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_empty_is_zero() {
        assert!(percentile(&[], 0.5).abs() < f64::EPSILON);
        let summary = LatencySummary::from_samples(&[]);
        assert_eq!(summary, LatencySummary::default());
    }

    #[test]
    fn test_percentile_single_sample() {
        let sorted = [0.7];
        assert!((percentile(&sorted, 0.5) - 0.7).abs() < f64::EPSILON);
        assert!((percentile(&sorted, 0.99) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentile_clamps_at_upper_bound() {
        let sorted = [1.0, 2.0, 3.0];
        assert!((percentile(&sorted, 1.0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentile_floor_index() {
        let sorted: Vec<f64> = (1..=100).map(f64::from).collect();
        // floor(100 * 0.5) = 50 -> value 51
        assert!((percentile(&sorted, 0.50) - 51.0).abs() < f64::EPSILON);
        assert!((percentile(&sorted, 0.95) - 96.0).abs() < f64::EPSILON);
        assert!((percentile(&sorted, 0.99) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_sorts_input() {
        let summary = LatencySummary::from_samples(&[0.3, 0.1, 0.2, 0.4]);
        assert_eq!(summary.samples, 4);
        assert!((summary.p50 - 0.3).abs() < f64::EPSILON);
        assert!((summary.p99 - 0.4).abs() < f64::EPSILON);
        assert!((summary.mean - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_percentiles_are_monotonic() {
        let samples = [5.0, 0.5, 9.0, 3.3, 3.3, 0.0, 7.1, 2.2, 8.8, 1.0, 4.4];
        let summary = LatencySummary::from_samples(&samples);
        assert!(summary.p50 <= summary.p95);
        assert!(summary.p95 <= summary.p99);
    }

    #[test]
    fn test_snapshot_accessors() {
        let mut stages = BTreeMap::new();
        stages.insert(
            "a.handle".to_string(),
            StageMetrics {
                success_count: 3,
                error_count: 1,
                ..StageMetrics::default()
            },
        );
        let now = Utc::now();
        let snapshot = MetricsSnapshot {
            taken_at: now,
            window_started_at: now,
            stages,
        };

        assert_eq!(snapshot.success_count("a.handle"), 3);
        assert_eq!(snapshot.error_count("a.handle"), 1);
        assert_eq!(snapshot.success_count("missing.handle"), 0);
        assert_eq!(snapshot.total_successes(), 3);
        assert_eq!(snapshot.total_errors(), 1);
        assert_eq!(snapshot.to_json()["stages"]["a.handle"]["success_count"], 3);
    }
}
