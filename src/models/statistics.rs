//! Run statistics
//!
//! Aggregate counts, duration statistics, and speedup for a parallel run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TaskResult;

/// Wall-clock durations below this are treated as degenerate for speedup
const MIN_PARALLEL_SECS: f64 = 0.001;

/// Duration percentiles over per-feature run times (seconds)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
}

impl Percentiles {
    /// Calculate percentiles from sorted durations
    pub fn from_sorted(durations: &[f64]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }

        Self {
            p50: percentile(durations, 50.0),
            p90: percentile(durations, 90.0),
            p95: percentile(durations, 95.0),
        }
    }
}

/// Linear-interpolated percentile of a sorted slice
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let idx = (p / 100.0) * (len - 1) as f64;
            let lower = idx.floor() as usize;
            let upper = idx.ceil() as usize;
            let fraction = idx - lower as f64;

            if upper >= len {
                sorted[len - 1]
            } else {
                sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction
            }
        }
    }
}

/// Statistics derived from one run's task results
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_features: usize,
    pub passed_features: usize,
    pub failed_features: usize,
    /// Sum of per-feature durations (sequential equivalent)
    pub total_duration: f64,
    pub max_duration: f64,
    pub min_duration: f64,
    pub avg_duration: f64,
    pub percentiles: Percentiles,
    /// Wall-clock duration of the parallel run
    pub parallel_duration: f64,
    pub speedup: f64,
}

impl RunStatistics {
    pub fn compute(results: &[TaskResult], wall_clock: Duration) -> Self {
        let total_features = results.len();
        let passed_features = results.iter().filter(|r| r.success).count();

        let mut durations: Vec<f64> = results.iter().map(|r| r.duration).collect();
        durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let total_duration: f64 = durations.iter().sum();
        let min_duration = durations.first().copied().unwrap_or(0.0);
        let max_duration = durations.last().copied().unwrap_or(0.0);
        let avg_duration = if durations.is_empty() {
            0.0
        } else {
            total_duration / durations.len() as f64
        };

        let parallel_duration = wall_clock.as_secs_f64();
        let speedup = if parallel_duration < MIN_PARALLEL_SECS {
            1.0
        } else {
            total_duration / parallel_duration
        };

        Self {
            total_features,
            passed_features,
            failed_features: total_features - passed_features,
            total_duration,
            max_duration,
            min_duration,
            avg_duration,
            percentiles: Percentiles::from_sorted(&durations),
            parallel_duration,
            speedup,
        }
    }

    /// Percentage of features that passed
    pub fn success_rate(&self) -> f64 {
        if self.total_features == 0 {
            0.0
        } else {
            (self.passed_features as f64 / self.total_features as f64) * 100.0
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed_features == 0
    }
}
