// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Timing statistics and the pure merge that assembles a benchmark result.
//!
//! Everything here is deterministic given identical inputs: no clock reads,
//! no randomness, no I/O. Calling [`merge`] twice with the same inputs yields
//! bit-identical records, which reproducibility tests rely on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::result::{BenchmarkResult, MetricValue, Parameter, ResourceStats};

/// Wall-clock statistics over the timed rounds of one benchmark.
///
/// All duration fields are seconds per iteration. Computed eagerly and once;
/// the struct carries no derived state that could go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    /// Fastest round.
    pub min: f64,
    /// Slowest round.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (zero for a single round).
    pub stddev: f64,
    /// 50th percentile.
    pub median: f64,
    /// 25th percentile.
    pub q1: f64,
    /// 75th percentile.
    pub q3: f64,
    /// Interquartile range, `q3 - q1`.
    pub iqr: f64,
    /// Rounds outside `[q1 - 1.5*iqr, q3 + 1.5*iqr]`.
    pub iqr_outliers: u64,
    /// Rounds more than one standard deviation from the mean.
    pub stddev_outliers: u64,
    /// Number of timed rounds.
    pub rounds: u64,
    /// Workload invocations per round, fixed by calibration.
    pub iterations: u64,
    /// Sum of all per-iteration samples, seconds.
    pub total: f64,
    /// Operations per second, `1 / mean`.
    pub ops: f64,
}

impl TimingStats {
    /// Unit for every duration field.
    pub const UNIT: &'static str = crate::units::SECONDS;

    /// Compute statistics from per-iteration round samples.
    ///
    /// `samples` holds one entry per round: the round's elapsed time divided
    /// by `iterations`. An empty slice is refused — a benchmark with zero
    /// timed rounds is invalid and must not produce a result.
    pub fn from_round_samples(samples: &[f64], iterations: u64) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::Stats(
                "cannot build timing statistics from zero rounds".to_string(),
            ));
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let total: f64 = sorted.iter().sum();
        let mean = total / n as f64;

        let stddev = if n > 1 {
            let var = sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        let q1 = percentile(&sorted, 25.0);
        let median = percentile(&sorted, 50.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        let lo = q1 - 1.5 * iqr;
        let hi = q3 + 1.5 * iqr;
        let iqr_outliers = sorted.iter().filter(|&&s| s < lo || s > hi).count() as u64;
        let stddev_outliers = sorted
            .iter()
            .filter(|&&s| (s - mean).abs() > stddev && stddev > 0.0)
            .count() as u64;

        Ok(Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean,
            stddev,
            median,
            q1,
            q3,
            iqr,
            iqr_outliers,
            stddev_outliers,
            rounds: n as u64,
            iterations,
            total,
            ops: if mean > 0.0 { 1.0 / mean } else { 0.0 },
        })
    }
}

/// Linear-interpolation percentile over pre-sorted samples.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Running maxima retained from a polling pass.
///
/// Samples themselves are ephemeral; only the extrema survive. A maximum is
/// kept rather than an average because polling is lossy — the reported peak
/// is explicitly a lower bound on the true peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceExtrema {
    /// Highest device memory reading, bytes.
    pub peak_memory_bytes: u64,
    /// Highest device utilization reading, percent.
    pub peak_utilization_percent: f64,
}

impl ResourceExtrema {
    /// Fold another reading into the running maxima.
    pub fn observe(&mut self, memory_bytes: u64, utilization_percent: f64) {
        self.peak_memory_bytes = self.peak_memory_bytes.max(memory_bytes);
        self.peak_utilization_percent = self.peak_utilization_percent.max(utilization_percent);
    }

    /// Merge maxima from another polling pass.
    pub fn fold(&mut self, other: ResourceExtrema) {
        self.observe(other.peak_memory_bytes, other.peak_utilization_percent);
    }
}

/// Peak/leak figures produced by an allocation-log scan, folded into the
/// resource record as an additional dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationFigures {
    /// Maximum concurrent allocation balance over the bracket, bytes.
    pub peak_bytes: u64,
    /// Residual balance at the end of the bracket, bytes. Negative only for
    /// an inconsistent log.
    pub leaked_bytes: i64,
}

/// Resource-measurement inputs to [`merge`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceInput {
    /// Poller maxima. `None` when the poller took zero samples.
    pub extrema: Option<ResourceExtrema>,
    /// Number of sampled workload re-invocations.
    pub gpu_rounds: u32,
    /// Allocation-log figures, when logging was bracketed around the run.
    pub allocation: Option<AllocationFigures>,
}

/// Merge the outputs of the timing pass, the sampling pass and any custom
/// metrics into one immutable [`BenchmarkResult`].
///
/// Pure and deterministic. Fails when the sampled round count exceeds the
/// timing round count, or when two custom metrics share a name.
pub fn merge(
    name: impl Into<String>,
    parameters: Vec<Parameter>,
    timing: TimingStats,
    resource: Option<ResourceInput>,
    custom: Vec<(String, MetricValue)>,
) -> Result<BenchmarkResult> {
    if let Some(input) = &resource {
        if u64::from(input.gpu_rounds) > timing.rounds {
            return Err(Error::Stats(format!(
                "sampled round count {} exceeds timing round count {}",
                input.gpu_rounds, timing.rounds
            )));
        }
    }

    let mut custom_metrics = BTreeMap::new();
    for (metric_name, value) in custom {
        if custom_metrics.insert(metric_name.clone(), value).is_some() {
            return Err(Error::DuplicateMetric(metric_name));
        }
    }

    let resource = resource.map(|input| ResourceStats {
        peak_memory_bytes: input.extrema.map(|e| e.peak_memory_bytes),
        peak_utilization_percent: input.extrema.map(|e| e.peak_utilization_percent),
        gpu_rounds: input.gpu_rounds,
        leaked_memory_bytes: input.allocation.map(|a| a.leaked_bytes),
        logged_peak_bytes: input.allocation.map(|a| a.peak_bytes),
    });

    Ok(BenchmarkResult {
        name: name.into(),
        parameters,
        timing,
        resource,
        custom_metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_round_stats() {
        let stats = TimingStats::from_round_samples(&[0.25], 10).unwrap();
        assert_eq!(stats.min, 0.25);
        assert_eq!(stats.max, 0.25);
        assert_eq!(stats.mean, 0.25);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.median, 0.25);
        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.iterations, 10);
        assert_eq!(stats.ops, 4.0);
    }

    #[test]
    fn test_stats_quartiles() {
        let stats = TimingStats::from_round_samples(&[1.0, 2.0, 3.0, 4.0, 5.0], 1).unwrap();
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.iqr, 2.0);
        assert_eq!(stats.iqr_outliers, 0);
    }

    #[test]
    fn test_stats_interpolated_quartiles() {
        let stats = TimingStats::from_round_samples(&[1.0, 2.0, 3.0, 4.0], 1).unwrap();
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
    }

    #[test]
    fn test_stats_detect_iqr_outlier() {
        let mut samples = vec![1.0; 20];
        samples.push(50.0);
        let stats = TimingStats::from_round_samples(&samples, 1).unwrap();
        assert_eq!(stats.iqr_outliers, 1);
        assert_eq!(stats.max, 50.0);
    }

    #[test]
    fn test_stats_sample_order_is_irrelevant() {
        let a = TimingStats::from_round_samples(&[3.0, 1.0, 2.0], 1).unwrap();
        let b = TimingStats::from_round_samples(&[1.0, 2.0, 3.0], 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_rounds_is_refused() {
        let err = TimingStats::from_round_samples(&[], 1).unwrap_err();
        assert!(matches!(err, Error::Stats(_)));
    }

    #[test]
    fn test_extrema_keep_maxima() {
        let mut extrema = ResourceExtrema {
            peak_memory_bytes: 100,
            peak_utilization_percent: 40.0,
        };
        extrema.observe(50, 80.0);
        assert_eq!(extrema.peak_memory_bytes, 100);
        assert_eq!(extrema.peak_utilization_percent, 80.0);
        extrema.observe(300, 10.0);
        assert_eq!(extrema.peak_memory_bytes, 300);
        assert_eq!(extrema.peak_utilization_percent, 80.0);
    }

    fn timing_fixture() -> TimingStats {
        TimingStats::from_round_samples(&[0.01, 0.011, 0.012, 0.013], 100).unwrap()
    }

    #[test]
    fn test_merge_is_pure() {
        let build = || {
            merge(
                "suite.scan",
                vec![Parameter::new("size", "1024")],
                timing_fixture(),
                Some(ResourceInput {
                    extrema: Some(ResourceExtrema {
                        peak_memory_bytes: 4096,
                        peak_utilization_percent: 55.5,
                    }),
                    gpu_rounds: 2,
                    allocation: Some(AllocationFigures {
                        peak_bytes: 150,
                        leaked_bytes: 80,
                    }),
                }),
                vec![("rows_per_sec".to_string(), MetricValue::new(9.0, "rows/s"))],
            )
            .unwrap()
        };
        let first = serde_json::to_string(&build()).unwrap();
        let second = serde_json::to_string(&build()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_rejects_excess_sampled_rounds() {
        let err = merge(
            "suite.scan",
            Vec::new(),
            timing_fixture(),
            Some(ResourceInput {
                extrema: None,
                gpu_rounds: 10,
                allocation: None,
            }),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Stats(_)));
    }

    #[test]
    fn test_merge_rejects_duplicate_metric_names() {
        let err = merge(
            "suite.scan",
            Vec::new(),
            timing_fixture(),
            None,
            vec![
                ("throughput".to_string(), MetricValue::new(1.0, "rows/s")),
                ("throughput".to_string(), MetricValue::new(2.0, "rows/s")),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateMetric(name) if name == "throughput"));
    }

    #[test]
    fn test_merge_without_extrema_keeps_absence_explicit() {
        let result = merge(
            "suite.scan",
            Vec::new(),
            timing_fixture(),
            Some(ResourceInput {
                extrema: None,
                gpu_rounds: 1,
                allocation: None,
            }),
            Vec::new(),
        )
        .unwrap();
        let resource = result.resource.unwrap();
        assert_eq!(resource.peak_memory_bytes, None);
        assert_eq!(resource.peak_utilization_percent, None);
        assert_eq!(resource.gpu_rounds, 1);
    }
}
