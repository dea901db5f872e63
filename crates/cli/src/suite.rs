//! The built-in measurement suite.
//!
//! A small set of synthetic workloads exercising the full pipeline: timing
//! calibration, resource sampling against the configured probe backend, and
//! custom metrics. Useful as a smoke test of the harness on a new machine
//! and as the canonical example of driving the orchestrator.

use std::hint::black_box;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;

use accelbench_core::{RunMetadata, Session};
use accelbench_harness::{
    BenchmarkConfig, BenchmarkSpec, JsonDirSink, MetricRegistry, Orchestrator, SamplingOptions,
    TimingOptions,
};
use accelbench_sampler::ProbeFactory;

/// Options collected from the `run` subcommand.
pub(crate) struct SuiteOptions {
    pub output: PathBuf,
    pub sample_resources: bool,
    pub devices: Vec<u32>,
    pub max_sampled_rounds: Option<u32>,
    pub min_rounds: u64,
    pub max_time: f64,
    pub commit: Option<String>,
    pub verbose: bool,
}

/// Run every built-in benchmark and write the session to disk.
pub(crate) fn run_suite(opts: SuiteOptions) -> anyhow::Result<()> {
    let config = BenchmarkConfig {
        timing: TimingOptions {
            min_rounds: opts.min_rounds,
            max_time: Duration::from_secs_f64(opts.max_time),
            ..TimingOptions::default()
        },
        sampling: opts.sample_resources.then(|| SamplingOptions {
            devices: opts.devices.clone(),
            max_sampled_rounds: opts.max_sampled_rounds,
            ..SamplingOptions::default()
        }),
    };

    let mut orchestrator = Orchestrator::new();
    if opts.sample_resources {
        orchestrator = orchestrator.probe_factory(probe_factory());
    }

    let mut session = Session::new(RunMetadata::collect(opts.commit));
    let mut failures = 0usize;

    // Arithmetic-bound workload: no allocation, tight loop.
    let outcome = orchestrator.run_benchmark(
        &mut session,
        BenchmarkSpec::new("builtin.checksum_loop").with_parameter("n", "4096"),
        &config,
        &MetricRegistry::<u64>::new(),
        None,
        || {
            let mut acc = 0u64;
            for i in 0..4096u64 {
                acc = acc.wrapping_mul(31).wrapping_add(black_box(i));
            }
            Ok(black_box(acc))
        },
    );
    if let Err(err) = outcome {
        failures += 1;
        eprintln!("{} {err}", "benchmark failed:".red().bold());
    }

    // Allocation-bound workload, with a custom metric derived from its
    // return value.
    let mut metrics = MetricRegistry::<usize>::new();
    metrics
        .register("allocated", "bytes", |total: &usize| *total as f64)
        .context("registering suite metric")?;
    let outcome = orchestrator.run_benchmark(
        &mut session,
        BenchmarkSpec::new("builtin.vec_churn").with_parameter("len", "16384"),
        &config,
        &metrics,
        None,
        || {
            let mut total = 0usize;
            for _ in 0..8 {
                let buf: Vec<u8> = vec![0xAB; 16384];
                total += buf.len();
                black_box(&buf);
            }
            Ok(total)
        },
    );
    if let Err(err) = outcome {
        failures += 1;
        eprintln!("{} {err}", "benchmark failed:".red().bold());
    }

    if opts.verbose {
        for result in session.results() {
            println!(
                "  - {}: mean {:.6}s over {} round(s)",
                result.display_name(),
                result.timing.mean,
                result.timing.rounds
            );
        }
    }

    let completed = session.len();
    let mut sink = JsonDirSink::new(&opts.output);
    session.finish(&mut sink).context("writing session output")?;

    println!(
        "{} {completed} benchmark(s), {failures} failure(s)",
        "Completed".green().bold()
    );
    println!("Results written to {}", opts.output.display());
    Ok(())
}

/// Pick the best available probe backend.
fn probe_factory() -> Box<dyn ProbeFactory> {
    #[cfg(feature = "nvml")]
    {
        match accelbench_sampler::NvmlProbeFactory::init() {
            Ok(factory) => return Box::new(factory),
            Err(err) => {
                tracing::warn!(%err, "NVML unavailable; falling back to the host probe")
            }
        }
    }
    Box::new(accelbench_sampler::HostProbeFactory)
}
