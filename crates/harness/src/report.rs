// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown report generation.
//!
//! Timing columns share one unit chosen from the fastest benchmark in the
//! session, so values stay comparable down a column. Memory columns are raw
//! bytes. Resource columns render `-` when a benchmark carries no data for
//! them; absence is never rendered as zero.

use std::fmt::Write;

use accelbench_core::{BenchmarkResult, RunMetadata};

/// Generate the session summary document.
pub fn generate_summary(metadata: &RunMetadata, results: &[BenchmarkResult]) -> String {
    let mut out = String::new();

    writeln!(out, "# Benchmark Summary").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "- Machine: {}", metadata.machine).unwrap();
    writeln!(out, "- OS: {}", metadata.os).unwrap();
    writeln!(out, "- RAM: {} bytes", metadata.ram_bytes).unwrap();
    match &metadata.accelerator {
        Some(info) => writeln!(
            out,
            "- Accelerator: {} (driver {})",
            info.name, info.driver_version
        )
        .unwrap(),
        None => writeln!(out, "- Accelerator: none observed").unwrap(),
    }
    if let Some(commit) = &metadata.commit {
        writeln!(out, "- Commit: {commit}").unwrap();
    }
    writeln!(out, "- Started: {}", metadata.timestamp.to_rfc3339()).unwrap();
    writeln!(out).unwrap();

    if results.is_empty() {
        writeln!(out, "No benchmarks were recorded.").unwrap();
        return out;
    }

    let (unit, scale) = time_unit(results);
    writeln!(out, "## Results (time in {unit}, mem in bytes)").unwrap();
    writeln!(out).unwrap();
    writeln!(
        out,
        "| Name | Min | Max | Mean | StdDev | Median | IQR | Outliers | OPS | \
         GPU mem | GPU Leaked mem | Rounds | GPU Rounds | Iterations |"
    )
    .unwrap();
    writeln!(
        out,
        "|------|-----|-----|------|--------|--------|-----|----------|-----|\
         ---------|----------------|--------|------------|------------|"
    )
    .unwrap();

    for result in results {
        let t = &result.timing;
        let gpu_mem = opt_u64(result.resource.as_ref().and_then(|r| r.peak_memory_bytes));
        let gpu_leaked = opt_i64(
            result
                .resource
                .as_ref()
                .and_then(|r| r.leaked_memory_bytes),
        );
        let gpu_rounds = result
            .resource
            .as_ref()
            .map(|r| r.gpu_rounds.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {};{} | {} | {} | {} | {} | {} | {} |",
            result.display_name(),
            fmt_time(t.min, scale),
            fmt_time(t.max, scale),
            fmt_time(t.mean, scale),
            fmt_time(t.stddev, scale),
            fmt_time(t.median, scale),
            fmt_time(t.iqr, scale),
            t.stddev_outliers,
            t.iqr_outliers,
            fmt_ops(t.ops),
            gpu_mem,
            gpu_leaked,
            t.rounds,
            gpu_rounds,
            t.iterations,
        )
        .unwrap();
    }

    let with_custom: Vec<_> = results
        .iter()
        .filter(|r| !r.custom_metrics.is_empty())
        .collect();
    if !with_custom.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "## Custom metrics").unwrap();
        for result in with_custom {
            writeln!(out).unwrap();
            writeln!(out, "### {}", result.display_name()).unwrap();
            for (name, metric) in &result.custom_metrics {
                writeln!(out, "- {name}: {:.4} {}", metric.value, metric.unit).unwrap();
            }
        }
    }

    writeln!(out).unwrap();
    writeln!(out, "---").unwrap();
    writeln!(out, "Total benchmarks: {}", results.len()).unwrap();
    writeln!(out, "Legend:").unwrap();
    writeln!(
        out,
        "  Outliers: rounds beyond 1 standard deviation from the mean; \
         beyond 1.5 IQR from the 1st and 3rd quartile."
    )
    .unwrap();
    writeln!(out, "  OPS: operations per second, computed as 1 / mean.").unwrap();
    writeln!(
        out,
        "  GPU columns rest on GPU Rounds executions, measured separately from timing."
    )
    .unwrap();

    out
}

/// Pick the display unit from the fastest recorded round.
fn time_unit(results: &[BenchmarkResult]) -> (&'static str, f64) {
    let best = results
        .iter()
        .map(|r| r.timing.min)
        .fold(f64::INFINITY, f64::min);
    if best < 1e-6 {
        ("ns", 1e9)
    } else if best < 1e-3 {
        ("us", 1e6)
    } else if best < 1.0 {
        ("ms", 1e3)
    } else {
        ("s", 1.0)
    }
}

fn fmt_time(seconds: f64, scale: f64) -> String {
    format!("{:.4}", seconds * scale)
}

fn fmt_ops(ops: f64) -> String {
    format!("{ops:.2}")
}

fn opt_u64(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn opt_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use accelbench_core::{MetricValue, ResourceStats, TimingStats};
    use chrono::Utc;

    use super::*;

    fn metadata() -> RunMetadata {
        RunMetadata {
            machine: "box".to_string(),
            os: "linux".to_string(),
            ram_bytes: 1,
            accelerator: None,
            commit: None,
            timestamp: Utc::now(),
        }
    }

    fn result(name: &str, resource: Option<ResourceStats>) -> BenchmarkResult {
        BenchmarkResult {
            name: name.to_string(),
            parameters: Vec::new(),
            timing: TimingStats::from_round_samples(&[0.002, 0.003], 10).unwrap(),
            resource,
            custom_metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn test_summary_scales_to_milliseconds() {
        let summary = generate_summary(&metadata(), &[result("suite.a", None)]);
        assert!(summary.contains("time in ms"));
        assert!(summary.contains("| suite.a |"));
        assert!(summary.contains("2.0000"));
    }

    #[test]
    fn test_missing_resource_data_renders_dashes_not_zeros() {
        let summary = generate_summary(&metadata(), &[result("suite.a", None)]);
        let row = summary
            .lines()
            .find(|l| l.starts_with("| suite.a"))
            .unwrap();
        assert!(row.contains("| - |"));
    }

    #[test]
    fn test_resource_columns_render_values() {
        let resource = ResourceStats {
            peak_memory_bytes: Some(4096),
            peak_utilization_percent: Some(60.0),
            gpu_rounds: 3,
            leaked_memory_bytes: Some(80),
            logged_peak_bytes: Some(150),
        };
        let summary = generate_summary(&metadata(), &[result("suite.gpu", Some(resource))]);
        let row = summary
            .lines()
            .find(|l| l.starts_with("| suite.gpu"))
            .unwrap();
        assert!(row.contains("4096"));
        assert!(row.contains("80"));
        assert!(row.contains(" 3 "));
    }

    #[test]
    fn test_custom_metrics_section() {
        let mut r = result("suite.custom", None);
        r.custom_metrics.insert(
            "rows_per_sec".to_string(),
            MetricValue::new(123.4567, "rows/s"),
        );
        let summary = generate_summary(&metadata(), &[r]);
        assert!(summary.contains("## Custom metrics"));
        assert!(summary.contains("rows_per_sec: 123.4567 rows/s"));
    }

    #[test]
    fn test_empty_session_summary() {
        let summary = generate_summary(&metadata(), &[]);
        assert!(summary.contains("No benchmarks were recorded."));
    }
}
