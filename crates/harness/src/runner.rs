// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The timing pass.
//!
//! Calibration runs first and fixes the iterations-per-round count for every
//! subsequent round of the benchmark. Rounds then repeat until the minimum
//! round count is satisfied and either the time budget is spent or the
//! distribution has stabilized. The stop criterion is deterministic given
//! the same clock, which the reproducibility tests rely on.
//!
//! The runner only invokes the workload and reads the clock; it allocates no
//! device resources that could bias a concurrently running sampler.

use std::time::Duration;

use accelbench_core::{Error, Phase, Result, TimingStats};

use crate::clock::Clock;
use crate::config::TimingOptions;
use crate::WorkloadResult;

/// Calibration scales iterations per round by this factor per attempt.
const CALIBRATION_SCALE: u64 = 10;

/// Attempts before calibration gives up and surfaces the error.
const MAX_CALIBRATION_ATTEMPTS: u32 = 8;

/// A round must take at least this many clock resolutions to be trusted.
const RESOLUTION_MULTIPLIER: u32 = 100;

/// Rounds considered by the stabilization criterion.
const STABILITY_WINDOW: usize = 8;

/// Relative spread below which the recent window counts as stable.
const STABILITY_TOLERANCE: f64 = 0.05;

/// Raw output of the timing pass.
#[derive(Debug, Clone)]
pub struct TimingSamples {
    /// One entry per round: round duration divided by iterations, seconds.
    pub per_iteration_secs: Vec<f64>,
    /// Iterations per round fixed by calibration.
    pub iterations: u64,
}

impl TimingSamples {
    /// Number of timed rounds.
    pub fn rounds(&self) -> u64 {
        self.per_iteration_secs.len() as u64
    }

    /// Eagerly computed statistics over the rounds.
    pub fn stats(&self) -> Result<TimingStats> {
        TimingStats::from_round_samples(&self.per_iteration_secs, self.iterations)
    }
}

/// Executes the timing pass for one benchmark.
pub struct TimingRunner<'a, C: Clock> {
    clock: &'a C,
    options: &'a TimingOptions,
}

impl<'a, C: Clock> TimingRunner<'a, C> {
    /// Create a runner over the given clock and bounds.
    pub fn new(clock: &'a C, options: &'a TimingOptions) -> Self {
        Self { clock, options }
    }

    /// Run calibration, optional warmup, and the timed rounds.
    ///
    /// `benchmark` is used for error context only.
    pub fn measure<T>(
        &self,
        benchmark: &str,
        workload: &mut dyn FnMut() -> WorkloadResult<T>,
    ) -> Result<TimingSamples> {
        let iterations = self.calibrate(benchmark, workload)?;
        tracing::debug!(benchmark, iterations, "calibrated iterations per round");

        if self.options.warmup {
            self.run_round(benchmark, workload, iterations)?;
        }

        let min_rounds = self.options.min_rounds.max(1);
        let mut samples = Vec::new();
        let started = self.clock.now();
        loop {
            let elapsed = self.run_round(benchmark, workload, iterations)?;
            samples.push(elapsed.as_secs_f64() / iterations as f64);

            if (samples.len() as u64) < min_rounds {
                continue;
            }
            let total = self.clock.now().saturating_sub(started);
            if total >= self.options.max_time || stabilized(&samples) {
                break;
            }
        }

        Ok(TimingSamples {
            per_iteration_secs: samples,
            iterations,
        })
    }

    /// Find the iterations-per-round count at which one round is resolvable
    /// by the clock.
    ///
    /// Failure to resolve is recovered internally by scaling the count up;
    /// only an exhausted scale budget surfaces as [`Error::Calibration`].
    fn calibrate<T>(
        &self,
        benchmark: &str,
        workload: &mut dyn FnMut() -> WorkloadResult<T>,
    ) -> Result<u64> {
        let floor = self.clock.resolution() * RESOLUTION_MULTIPLIER;
        let target = self.options.min_time.max(floor);

        let mut iterations = 1u64;
        let mut elapsed = Duration::ZERO;
        for _ in 0..MAX_CALIBRATION_ATTEMPTS {
            elapsed = self.run_round(benchmark, workload, iterations)?;
            if elapsed >= target {
                return Ok(iterations);
            }
            iterations = iterations.saturating_mul(CALIBRATION_SCALE);
        }

        Err(Error::Calibration {
            iterations: iterations / CALIBRATION_SCALE,
            elapsed,
            target,
        })
    }

    fn run_round<T>(
        &self,
        benchmark: &str,
        workload: &mut dyn FnMut() -> WorkloadResult<T>,
        iterations: u64,
    ) -> Result<Duration> {
        let start = self.clock.now();
        for _ in 0..iterations {
            workload().map_err(|err| Error::execution(benchmark, Phase::Timing, err))?;
        }
        Ok(self.clock.now().saturating_sub(start))
    }
}

/// Whether the most recent window of rounds has settled.
///
/// The window's relative spread — (max − min) / mean — must drop below the
/// tolerance. Purely a function of the samples, hence deterministic for a
/// deterministic clock.
fn stabilized(samples: &[f64]) -> bool {
    if samples.len() < STABILITY_WINDOW {
        return false;
    }
    let window = &samples[samples.len() - STABILITY_WINDOW..];
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for &s in window {
        min = min.min(s);
        max = max.max(s);
        sum += s;
    }
    let mean = sum / window.len() as f64;
    if mean <= 0.0 {
        return true;
    }
    (max - min) / mean <= STABILITY_TOLERANCE
}
