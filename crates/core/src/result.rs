// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The immutable per-benchmark result record.
//!
//! A [`BenchmarkResult`] is produced exactly once per executed benchmark by
//! the statistics aggregator, handed to a result sink at session end, and
//! never mutated in between. Derived values are computed eagerly when the
//! record is built; there are no lazily cached fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::TimingStats;

/// One named benchmark parameter. Parameter order is meaningful and preserved
/// exactly as registered, so reports can label parameterized runs the way the
/// author wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name. May be empty for unnamed positional parameters.
    pub name: String,
    /// Rendered parameter value.
    pub value: String,
}

impl Parameter {
    /// Create a parameter pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A custom metric value with its explicit unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Measured value.
    pub value: f64,
    /// Unit string supplied at registration. Never inferred.
    pub unit: String,
}

impl MetricValue {
    /// Create a metric value tagged with `unit`.
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// Device-resource statistics for one benchmark.
///
/// Present on a result only when resource measurement ran. Inner fields are
/// `None` when the poller took zero samples or allocation logging was off;
/// absence of data is always distinguishable from a legitimate zero reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    /// Peak device memory observed by the poller, in bytes. A lower bound on
    /// the true peak: spikes between polls are invisible.
    pub peak_memory_bytes: Option<u64>,
    /// Peak device utilization observed by the poller, in percent.
    pub peak_utilization_percent: Option<f64>,
    /// Number of sampled workload re-invocations these figures are based on.
    /// Reported distinctly from the timing round count so a reader can see
    /// resource metrics rest on fewer executions.
    pub gpu_rounds: u32,
    /// Residual allocated-but-not-freed bytes at the end of the allocation-log
    /// bracket. Negative only when the log itself was inconsistent.
    pub leaked_memory_bytes: Option<i64>,
    /// Peak concurrent allocation balance from the log scan, in bytes.
    pub logged_peak_bytes: Option<u64>,
}

/// Canonical immutable benchmark result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Hierarchical identifier (`module.class.function`), unique per session.
    pub name: String,
    /// Ordered parameter set. Empty when unparameterized.
    pub parameters: Vec<Parameter>,
    /// Wall-clock statistics from the timing pass. Timing values are seconds.
    pub timing: TimingStats,
    /// Resource statistics from the sampling pass, when it ran.
    pub resource: Option<ResourceStats>,
    /// User-supplied metrics keyed by name. Names are unique per result and
    /// serialization order is the key order, keeping output deterministic.
    pub custom_metrics: BTreeMap<String, MetricValue>,
}

impl BenchmarkResult {
    /// Render the name with its parameter list appended, e.g.
    /// `bench_scan[managed_memory=True, pool_allocator=False]`.
    pub fn display_name(&self) -> String {
        if self.parameters.is_empty() {
            return self.name.clone();
        }
        let params = self
            .parameters
            .iter()
            .map(|p| {
                if p.name.is_empty() {
                    p.value.clone()
                } else {
                    format!("{}={}", p.name, p.value)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}[{}]", self.name, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TimingStats;

    fn result_with_params(params: Vec<Parameter>) -> BenchmarkResult {
        BenchmarkResult {
            name: "bench_scan".to_string(),
            parameters: params,
            timing: TimingStats::from_round_samples(&[0.1, 0.2], 1).unwrap(),
            resource: None,
            custom_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn test_display_name_without_parameters() {
        let result = result_with_params(Vec::new());
        assert_eq!(result.display_name(), "bench_scan");
    }

    #[test]
    fn test_display_name_preserves_parameter_order() {
        let result = result_with_params(vec![
            Parameter::new("managed_memory", "True"),
            Parameter::new("pool_allocator", "False"),
        ]);
        assert_eq!(
            result.display_name(),
            "bench_scan[managed_memory=True, pool_allocator=False]"
        );
    }

    #[test]
    fn test_display_name_with_unnamed_parameter() {
        let result = result_with_params(vec![Parameter::new("", "1000")]);
        assert_eq!(result.display_name(), "bench_scan[1000]");
    }

    #[test]
    fn test_result_serialization_roundtrip() {
        let mut custom = BTreeMap::new();
        custom.insert(
            "rows_per_sec".to_string(),
            MetricValue::new(1.5e6, "rows/s"),
        );
        let result = BenchmarkResult {
            custom_metrics: custom,
            ..result_with_params(Vec::new())
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: BenchmarkResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
