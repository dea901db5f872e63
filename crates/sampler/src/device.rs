// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device probes: the capability seam between the poller and real hardware.
//!
//! The poller needs exactly two operations from a device — take a reading,
//! describe yourself — so that is the whole trait. Backends validate device
//! indices eagerly: resource measurement is opt-in, and a device that cannot
//! be queried must fail loudly at open time rather than produce silent zeros.

use accelbench_core::{AcceleratorInfo, Error, Result};
use sysinfo::System;

/// A point-in-time device reading.
///
/// Samples are ephemeral; the poller folds them into running maxima and
/// discards them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSample {
    /// Device memory currently in use, bytes.
    pub memory_used_bytes: u64,
    /// Device utilization, percent.
    pub utilization_percent: f64,
}

/// Read-only access to one device's metrics.
///
/// Implementations must not mutate device state; the harness only ever
/// queries it.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceProbe: Send {
    /// Take one reading.
    fn sample(&mut self) -> Result<DeviceSample>;

    /// Identify the observed device.
    fn info(&self) -> AcceleratorInfo;
}

/// Opens probes from configured device indices.
///
/// The index list exists for forward compatibility; only the first entry is
/// honored today. An invalid or unreachable index fails fast with
/// [`Error::DeviceUnavailable`].
pub trait ProbeFactory {
    /// Validate the first configured index and open a probe for it.
    fn open(&self, devices: &[u32]) -> Result<Box<dyn DeviceProbe>>;
}

/// Pick the single observed device out of a configured index list.
pub(crate) fn observed_device(devices: &[u32]) -> Result<u32> {
    match devices.first() {
        Some(&first) => {
            if devices.len() > 1 {
                tracing::warn!(
                    configured = devices.len(),
                    observed = first,
                    "multiple devices configured; only the first is observed"
                );
            }
            Ok(first)
        }
        None => Err(Error::DeviceUnavailable {
            device: 0,
            reason: "no device index configured".to_string(),
        }),
    }
}

/// Probe backed by the host process itself, via `sysinfo`.
///
/// Reports the benchmark process's resident memory and the host's CPU
/// utilization. Lets the full measurement pipeline run end-to-end on machines
/// without an accelerator; the real accelerator backend lives behind the
/// `nvml` feature.
pub struct HostProbe {
    system: System,
    pid: sysinfo::Pid,
}

impl DeviceProbe for HostProbe {
    fn sample(&mut self) -> Result<DeviceSample> {
        self.system.refresh_process(self.pid);
        self.system.refresh_cpu();
        let memory_used_bytes = self
            .system
            .process(self.pid)
            .map(|p| p.memory())
            .unwrap_or(0);
        let utilization_percent = f64::from(self.system.global_cpu_info().cpu_usage());
        Ok(DeviceSample {
            memory_used_bytes,
            utilization_percent,
        })
    }

    fn info(&self) -> AcceleratorInfo {
        AcceleratorInfo {
            name: "host-process".to_string(),
            driver_version: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Factory for [`HostProbe`]. The host exposes exactly one "device", index 0.
#[derive(Debug, Default)]
pub struct HostProbeFactory;

impl ProbeFactory for HostProbeFactory {
    fn open(&self, devices: &[u32]) -> Result<Box<dyn DeviceProbe>> {
        let device = observed_device(devices)?;
        if device != 0 {
            return Err(Error::DeviceUnavailable {
                device,
                reason: "host probe only exposes device 0".to_string(),
            });
        }
        let pid = sysinfo::get_current_pid().map_err(|reason| Error::DeviceUnavailable {
            device,
            reason: reason.to_string(),
        })?;
        Ok(Box::new(HostProbe {
            system: System::new(),
            pid,
        }))
    }
}

/// NVML-backed accelerator probing.
#[cfg(feature = "nvml")]
pub mod nvml {
    use std::sync::Arc;

    use accelbench_core::{AcceleratorInfo, Error, Result};
    use nvml_wrapper::Nvml;

    use super::{observed_device, DeviceProbe, DeviceSample, ProbeFactory};

    /// Probe reading one NVML device's memory and utilization.
    pub struct NvmlProbe {
        nvml: Arc<Nvml>,
        index: u32,
        info: AcceleratorInfo,
    }

    impl DeviceProbe for NvmlProbe {
        fn sample(&mut self) -> Result<DeviceSample> {
            let device = self
                .nvml
                .device_by_index(self.index)
                .map_err(|e| unavailable(self.index, e))?;
            let memory = device.memory_info().map_err(|e| unavailable(self.index, e))?;
            let rates = device
                .utilization_rates()
                .map_err(|e| unavailable(self.index, e))?;
            Ok(DeviceSample {
                memory_used_bytes: memory.used,
                utilization_percent: f64::from(rates.gpu),
            })
        }

        fn info(&self) -> AcceleratorInfo {
            self.info.clone()
        }
    }

    /// Factory validating indices against the local NVML driver.
    pub struct NvmlProbeFactory {
        nvml: Arc<Nvml>,
    }

    impl NvmlProbeFactory {
        /// Initialize NVML. Fails with [`Error::DeviceUnavailable`] when the
        /// driver is absent.
        pub fn init() -> Result<Self> {
            let nvml = Nvml::init().map_err(|e| unavailable(0, e))?;
            Ok(Self {
                nvml: Arc::new(nvml),
            })
        }
    }

    impl ProbeFactory for NvmlProbeFactory {
        fn open(&self, devices: &[u32]) -> Result<Box<dyn DeviceProbe>> {
            let index = observed_device(devices)?;
            let device = self
                .nvml
                .device_by_index(index)
                .map_err(|e| unavailable(index, e))?;
            let info = AcceleratorInfo {
                name: device
                    .name()
                    .unwrap_or_else(|_| "unknown accelerator".to_string()),
                driver_version: self
                    .nvml
                    .sys_driver_version()
                    .unwrap_or_else(|_| "unknown".to_string()),
            };
            Ok(Box::new(NvmlProbe {
                nvml: Arc::clone(&self.nvml),
                index,
                info,
            }))
        }
    }

    fn unavailable(device: u32, err: impl std::fmt::Display) -> Error {
        Error::DeviceUnavailable {
            device,
            reason: err.to_string(),
        }
    }
}
