// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement configuration.

use std::time::Duration;

use accelbench_sampler::{DEFAULT_POLL_INTERVAL, MIN_OBSERVATION_WINDOW};

/// Bounds on the timing pass.
#[derive(Debug, Clone)]
pub struct TimingOptions {
    /// Minimum number of timed rounds. Always satisfied before any stop
    /// criterion applies.
    pub min_rounds: u64,
    /// Smallest acceptable round duration; calibration scales iterations per
    /// round until a round takes at least this long (or the clock-resolution
    /// floor, whichever is larger).
    pub min_time: Duration,
    /// Measurement stops once this much wall-clock time has been spent in
    /// rounds and `min_rounds` is satisfied.
    pub max_time: Duration,
    /// Run one untimed round before measurement and discard it.
    pub warmup: bool,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            min_rounds: 5,
            min_time: Duration::from_micros(5),
            max_time: Duration::from_secs(1),
            warmup: false,
        }
    }
}

/// Bounds on the resource-sampling pass.
#[derive(Debug, Clone)]
pub struct SamplingOptions {
    /// Device indices to observe. Only the first entry is honored.
    pub devices: Vec<u32>,
    /// Cap on sampled workload re-invocations. The effective count is
    /// `min(timing rounds, this)`; `None` means one sampled round per timed
    /// round.
    pub max_sampled_rounds: Option<u32>,
    /// Poller cadence.
    pub poll_interval: Duration,
    /// Minimum time the poller stays up per sampled round, so that even a
    /// workload shorter than the polling interval is observed at least once.
    pub min_observation_window: Duration,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            devices: vec![0],
            max_sampled_rounds: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_observation_window: MIN_OBSERVATION_WINDOW,
        }
    }
}

/// Full per-benchmark configuration.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkConfig {
    /// Timing-pass bounds.
    pub timing: TimingOptions,
    /// Sampling-pass bounds; `None` disables resource measurement.
    pub sampling: Option<SamplingOptions>,
}

impl BenchmarkConfig {
    /// Configuration with resource sampling enabled at defaults.
    pub fn with_sampling() -> Self {
        Self {
            timing: TimingOptions::default(),
            sampling: Some(SamplingOptions::default()),
        }
    }
}
