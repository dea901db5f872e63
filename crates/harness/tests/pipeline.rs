// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline test: timing pass, host-probe sampling pass, custom
//! metrics, session teardown into the JSON sink.

use std::hint::black_box;
use std::time::Duration;

use accelbench_core::{RunMetadata, Session};
use accelbench_harness::sink::read_session;
use accelbench_harness::{
    BenchmarkConfig, BenchmarkSpec, JsonDirSink, MetricRegistry, Orchestrator, SamplingOptions,
    TimingOptions,
};
use accelbench_sampler::HostProbeFactory;

fn checksum(data: &[u64]) -> u64 {
    data.iter().fold(0u64, |acc, &v| acc.wrapping_add(v.rotate_left(7)))
}

#[test]
fn full_pipeline_records_and_persists_results() {
    let config = BenchmarkConfig {
        timing: TimingOptions {
            min_rounds: 3,
            min_time: Duration::from_micros(5),
            max_time: Duration::from_millis(50),
            warmup: true,
        },
        sampling: Some(SamplingOptions {
            devices: vec![0],
            max_sampled_rounds: Some(2),
            poll_interval: Duration::from_micros(500),
            min_observation_window: Duration::from_millis(5),
        }),
    };

    let orchestrator = Orchestrator::new().probe_factory(Box::new(HostProbeFactory));
    let mut session = Session::new(RunMetadata::collect(Some("test-commit".to_string())));

    let mut metrics = MetricRegistry::<u64>::new();
    metrics
        .register("checksum", "unitless", |value: &u64| *value as f64)
        .unwrap();

    orchestrator
        .run_benchmark(
            &mut session,
            BenchmarkSpec::new("pipeline.checksum").with_parameter("len", "512"),
            &config,
            &metrics,
            None,
            || {
                let data: Vec<u64> = (0..512).collect();
                Ok(black_box(checksum(&data)))
            },
        )
        .unwrap();

    assert_eq!(session.len(), 1);
    let result = &session.results()[0];
    assert!(result.timing.rounds >= 3);
    assert!(result.timing.min <= result.timing.max);

    let resource = result.resource.as_ref().expect("sampling ran");
    assert!(resource.gpu_rounds >= 1 && resource.gpu_rounds <= 2);
    assert!(u64::from(resource.gpu_rounds) <= result.timing.rounds);
    // The host probe reports this process's resident memory; the 5ms window
    // guarantees at least one sample.
    assert!(resource.peak_memory_bytes.unwrap() > 0);

    assert!(result.custom_metrics.contains_key("checksum"));

    // Session metadata picked up the probe identity.
    assert_eq!(
        session.metadata().accelerator.as_ref().unwrap().name,
        "host-process"
    );

    let dir = tempfile::tempdir().unwrap();
    let mut sink = JsonDirSink::new(dir.path());
    let combined = sink.combined_path();
    let summary = sink.summary_path();
    session.finish(&mut sink).unwrap();

    let record = read_session(combined).unwrap();
    assert_eq!(record.results.len(), 1);
    assert_eq!(record.metadata.commit.as_deref(), Some("test-commit"));

    let summary_text = std::fs::read_to_string(summary).unwrap();
    assert!(summary_text.contains("pipeline.checksum[len=512]"));
}
