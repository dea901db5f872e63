// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Coordination of the timing and sampling passes.
//!
//! The orchestrator runs the full timing measurement first, then re-invokes
//! the workload for a capped number of extra rounds with the poller active,
//! then evaluates custom metrics against the last workload output, and
//! finally hands everything to the statistics aggregator. Sampling overhead
//! can therefore never perturb the reported latency.
//!
//! Device failures are isolated per benchmark: an unavailable device
//! degrades the benchmark to timing-only results and the session moves on.
//! A failing workload aborts its benchmark with no partial result.

use std::thread;
use std::time::Instant;

use accelbench_alloclog::{AllocationLogControl, LogBracket};
use accelbench_core::stats::{self, ResourceExtrema, ResourceInput};
use accelbench_core::{Error, Parameter, Phase, Result, Session};
use accelbench_sampler::{DeviceProbe, MetricPoller, ProbeFactory};

use crate::clock::{Clock, MonotonicClock};
use crate::config::{BenchmarkConfig, SamplingOptions};
use crate::metrics::MetricRegistry;
use crate::runner::TimingRunner;
use crate::WorkloadResult;

/// Identity of one benchmark within a session.
#[derive(Debug, Clone)]
pub struct BenchmarkSpec {
    /// Hierarchical name (`module.class.function`).
    pub name: String,
    /// Ordered parameters this run was invoked with.
    pub parameters: Vec<Parameter>,
}

impl BenchmarkSpec {
    /// Spec with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter, preserving insertion order.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(name, value));
        self
    }
}

/// Drives one benchmark at a time through both measurement passes.
pub struct Orchestrator<C: Clock = MonotonicClock> {
    clock: C,
    probes: Option<Box<dyn ProbeFactory>>,
}

impl Orchestrator<MonotonicClock> {
    /// Orchestrator over the production clock, without resource sampling.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for Orchestrator<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Orchestrator<C> {
    /// Orchestrator over a caller-supplied clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            probes: None,
        }
    }

    /// Attach the probe factory used by sampling passes.
    pub fn probe_factory(mut self, factory: Box<dyn ProbeFactory>) -> Self {
        self.probes = Some(factory);
        self
    }

    /// Run one benchmark and record its result into the session.
    ///
    /// `allocation_log`, when given, brackets allocator logging around the
    /// sampling-phase invocations (or one extra invocation when sampling is
    /// off) and folds the resulting peak/leak figures into the resource
    /// record.
    ///
    /// Workloads are re-invoked for sampling, so they must be idempotent
    /// within one benchmark.
    pub fn run_benchmark<T>(
        &self,
        session: &mut Session,
        spec: BenchmarkSpec,
        config: &BenchmarkConfig,
        metrics: &MetricRegistry<T>,
        allocation_log: Option<&mut dyn AllocationLogControl>,
        mut workload: impl FnMut() -> WorkloadResult<T>,
    ) -> Result<()> {
        // Phase 1: uncontaminated timing distribution.
        let runner = TimingRunner::new(&self.clock, &config.timing);
        let samples = runner.measure(&spec.name, &mut workload)?;
        let timing = samples.stats().map_err(|_| {
            Error::execution(
                spec.name.as_str(),
                Phase::Timing,
                "timing pass produced zero rounds",
            )
        })?;
        tracing::debug!(
            benchmark = %spec.name,
            rounds = timing.rounds,
            mean = timing.mean,
            "timing pass complete"
        );

        // Phase 2: validate the device up front so sampling either runs or
        // is visibly absent from the result.
        let mut sampled: Option<(&SamplingOptions, &dyn ProbeFactory, Box<dyn DeviceProbe>)> =
            None;
        if let Some(sampling) = &config.sampling {
            match &self.probes {
                None => tracing::warn!(
                    benchmark = %spec.name,
                    "resource sampling requested but no probe factory is configured"
                ),
                Some(factory) => match factory.open(&sampling.devices) {
                    Ok(probe) => {
                        if session.metadata().accelerator.is_none() {
                            session.set_accelerator(probe.info());
                        }
                        sampled = Some((sampling, factory.as_ref(), probe));
                    }
                    Err(err @ Error::DeviceUnavailable { .. }) => {
                        tracing::warn!(
                            benchmark = %spec.name,
                            %err,
                            "device unavailable; benchmark completes timing-only"
                        );
                    }
                    Err(err) => return Err(err),
                },
            }
        }
        let sampling_attempted = sampled.is_some();

        // The allocation bracket wraps every sampling-phase invocation.
        let bracket = match allocation_log {
            Some(control) => {
                let prefix = std::env::temp_dir()
                    .join(format!("accelbench_log_{}", session.id()))
                    .to_string_lossy()
                    .into_owned();
                Some(LogBracket::enable(control, &prefix)?)
            }
            None => None,
        };
        let need_invocation = !metrics.is_empty() || bracket.is_some();

        let name = spec.name.clone();
        let pass: Result<(Option<ResourceExtrema>, u32, Option<T>)> = (|| {
            let mut extrema: Option<ResourceExtrema> = None;
            let mut completed = 0u32;
            let mut output: Option<T> = None;

            if let Some((sampling, factory, first_probe)) = sampled {
                let target = timing
                    .rounds
                    .min(u64::from(sampling.max_sampled_rounds.unwrap_or(u32::MAX)))
                    as u32;
                let mut probe = Some(first_probe);
                for round in 0..target {
                    let probe = match probe.take() {
                        Some(p) => p,
                        None => match factory.open(&sampling.devices) {
                            Ok(p) => p,
                            Err(err) => {
                                tracing::warn!(
                                    benchmark = %name,
                                    round,
                                    %err,
                                    "device lost mid-sampling; keeping completed rounds"
                                );
                                break;
                            }
                        },
                    };

                    let handle = MetricPoller::start(probe, sampling.poll_interval)?;
                    let begun = Instant::now();
                    match workload() {
                        Ok(value) => output = Some(value),
                        Err(err) => {
                            // Dropping the handle stops the poller before
                            // the failure propagates.
                            drop(handle);
                            return Err(Error::execution(name.as_str(), Phase::Sampling, err));
                        }
                    }
                    let elapsed = begun.elapsed();
                    if elapsed < sampling.min_observation_window {
                        thread::sleep(sampling.min_observation_window - elapsed);
                    }
                    completed += 1;
                    match handle.stop() {
                        Some(round_extrema) => match extrema.as_mut() {
                            Some(acc) => acc.fold(round_extrema),
                            None => extrema = Some(round_extrema),
                        },
                        None => tracing::debug!(benchmark = %name, round, "round produced no samples"),
                    }
                }
            }

            if output.is_none() && need_invocation {
                output = Some(
                    workload()
                        .map_err(|err| Error::execution(name.as_str(), Phase::Sampling, err))?,
                );
            }

            Ok((extrema, completed, output))
        })();

        // The bracket is closed (logging disabled, files parsed and deleted)
        // even when the pass failed; the pass error takes precedence.
        let analysis = bracket.map(LogBracket::finish);
        let (extrema, gpu_rounds, last_output) = pass?;
        let allocation = match analysis.transpose()? {
            Some(analysis) => {
                for warning in &analysis.warnings {
                    tracing::warn!(
                        benchmark = %spec.name,
                        balance = warning.balance_bytes,
                        "allocation log inconsistency: {}",
                        warning.detail
                    );
                }
                Some(analysis.figures())
            }
            None => None,
        };

        // Phase 3: custom metrics against the final workload output.
        let custom = match (metrics.is_empty(), last_output) {
            (false, Some(output)) => metrics.compute(&output),
            _ => Vec::new(),
        };

        // Phase 4: pure merge and session bookkeeping.
        let resource = if sampling_attempted || allocation.is_some() {
            Some(ResourceInput {
                extrema,
                gpu_rounds,
                allocation,
            })
        } else {
            None
        };
        let result = stats::merge(spec.name, spec.parameters, timing, resource, custom)?;
        session.record(result)
    }
}
