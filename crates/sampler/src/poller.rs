// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The background polling loop.
//!
//! [`MetricPoller::start`] moves a probe onto a dedicated thread that samples
//! at a fixed cadence and folds every reading into shared running maxima.
//! [`PollHandle::stop`] halts the loop, joins the thread and returns the
//! extrema — or `None` when not a single sample was taken, because a
//! fabricated zero is indistinguishable from a real idle reading.
//!
//! The handle also stops the loop on `Drop`. A poller left running past a
//! workload failure would keep attributing load to a benchmark that is no
//! longer executing, so shutdown must hold on every exit path, including
//! unwinding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use accelbench_core::stats::ResourceExtrema;
use accelbench_core::Result;

use crate::device::DeviceProbe;

/// Default polling cadence. Short enough to catch typical workload phases;
/// a tunable, not a correctness requirement.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Minimum time a caller should keep the poller running before stopping it,
/// so that even a workload shorter than the polling interval is observed at
/// least once.
pub const MIN_OBSERVATION_WINDOW: Duration = Duration::from_millis(100);

/// Starts polling passes.
pub struct MetricPoller;

impl MetricPoller {
    /// Spawn the polling thread and begin sampling `probe` every `interval`.
    ///
    /// The first sample is taken immediately, before the first sleep.
    pub fn start(mut probe: Box<dyn DeviceProbe>, interval: Duration) -> Result<PollHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let extrema: Arc<Mutex<Option<ResourceExtrema>>> = Arc::new(Mutex::new(None));

        let thread_stop = Arc::clone(&stop);
        let thread_extrema = Arc::clone(&extrema);
        let thread = thread::Builder::new()
            .name("accelbench-poller".to_string())
            .spawn(move || {
                let mut warned = false;
                while !thread_stop.load(Ordering::Acquire) {
                    match probe.sample() {
                        Ok(sample) => {
                            let mut guard = lock_extrema(&thread_extrema);
                            match guard.as_mut() {
                                Some(e) => e.observe(
                                    sample.memory_used_bytes,
                                    sample.utilization_percent,
                                ),
                                None => {
                                    *guard = Some(ResourceExtrema {
                                        peak_memory_bytes: sample.memory_used_bytes,
                                        peak_utilization_percent: sample.utilization_percent,
                                    })
                                }
                            }
                        }
                        Err(err) => {
                            if !warned {
                                tracing::warn!(%err, "device sample failed; polling continues");
                                warned = true;
                            }
                        }
                    }
                    thread::sleep(interval);
                }
            })?;

        Ok(PollHandle {
            stop,
            extrema,
            thread: Some(thread),
        })
    }
}

/// Handle to a running polling pass.
pub struct PollHandle {
    stop: Arc<AtomicBool>,
    extrema: Arc<Mutex<Option<ResourceExtrema>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl PollHandle {
    /// Halt polling, join the thread and return the observed maxima.
    ///
    /// Returns `None` when zero samples were taken — absence of data, as
    /// opposed to a legitimate zero reading.
    pub fn stop(mut self) -> Option<ResourceExtrema> {
        self.halt();
        *lock_extrema(&self.extrema)
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("poller thread panicked");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

fn lock_extrema(
    extrema: &Mutex<Option<ResourceExtrema>>,
) -> std::sync::MutexGuard<'_, Option<ResourceExtrema>> {
    match extrema.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use accelbench_core::{AcceleratorInfo, Error};

    use super::*;
    use crate::device::{DeviceSample, MockDeviceProbe};

    fn scripted_probe(samples: Vec<DeviceSample>) -> MockDeviceProbe {
        let calls = AtomicUsize::new(0);
        let mut probe = MockDeviceProbe::new();
        probe.expect_sample().returning(move || {
            let i = calls.fetch_add(1, Ordering::SeqCst).min(samples.len() - 1);
            Ok(samples[i])
        });
        probe
    }

    #[test]
    fn test_poller_reports_running_maxima() {
        let probe = scripted_probe(vec![
            DeviceSample {
                memory_used_bytes: 100,
                utilization_percent: 10.0,
            },
            DeviceSample {
                memory_used_bytes: 900,
                utilization_percent: 35.0,
            },
            DeviceSample {
                memory_used_bytes: 400,
                utilization_percent: 80.0,
            },
        ]);

        let handle = MetricPoller::start(Box::new(probe), Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(50));
        let extrema = handle.stop().expect("samples were taken");

        assert_eq!(extrema.peak_memory_bytes, 900);
        assert_eq!(extrema.peak_utilization_percent, 80.0);
    }

    #[test]
    fn test_zero_samples_reports_no_data() {
        let mut probe = MockDeviceProbe::new();
        probe.expect_sample().returning(|| {
            Err(Error::DeviceUnavailable {
                device: 0,
                reason: "gone".to_string(),
            })
        });

        let handle = MetricPoller::start(Box::new(probe), Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(handle.stop(), None);
    }

    #[test]
    fn test_drop_stops_the_polling_thread() {
        let calls = Arc::new(AtomicUsize::new(0));
        let thread_calls = Arc::clone(&calls);
        let mut probe = MockDeviceProbe::new();
        probe.expect_sample().returning(move || {
            thread_calls.fetch_add(1, Ordering::SeqCst);
            Ok(DeviceSample {
                memory_used_bytes: 1,
                utilization_percent: 1.0,
            })
        });

        let handle = MetricPoller::start(Box::new(probe), Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(10));
        drop(handle);

        let after_drop = calls.load(Ordering::SeqCst);
        assert!(after_drop > 0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_mock_probe_info_is_unused_by_poller() {
        let mut probe = MockDeviceProbe::new();
        probe.expect_sample().returning(|| {
            Ok(DeviceSample {
                memory_used_bytes: 7,
                utilization_percent: 0.0,
            })
        });
        probe.expect_info().never().returning(|| AcceleratorInfo {
            name: "mock".to_string(),
            driver_version: "0".to_string(),
        });

        let handle = MetricPoller::start(Box::new(probe), Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(10));
        let extrema = handle.stop().unwrap();
        assert_eq!(extrema.peak_memory_bytes, 7);
    }
}
