// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! User-supplied custom metrics.
//!
//! A custom metric derives a number from the workload's return value,
//! independent of timing and resource sampling. Each compute function runs
//! at most once per benchmark per session, against the output of the
//! workload's final invocation.

use accelbench_core::{Error, MetricValue, Result};

struct MetricEntry<T> {
    name: String,
    unit: String,
    compute: Box<dyn Fn(&T) -> f64>,
}

/// Registered custom metrics for workloads returning `T`.
pub struct MetricRegistry<T> {
    entries: Vec<MetricEntry<T>>,
}

impl<T> Default for MetricRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MetricRegistry<T> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a metric. Names must be unique per benchmark; the unit is
    /// recorded verbatim on the result.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        unit: impl Into<String>,
        compute: impl Fn(&T) -> f64 + 'static,
    ) -> Result<()> {
        let name = name.into();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(Error::DuplicateMetric(name));
        }
        self.entries.push(MetricEntry {
            name,
            unit: unit.into(),
            compute: Box::new(compute),
        });
        Ok(())
    }

    /// Whether any metric is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Evaluate every metric against one workload output, in registration
    /// order.
    pub(crate) fn compute(&self, output: &T) -> Vec<(String, MetricValue)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.name.clone(),
                    MetricValue::new((entry.compute)(output), entry.unit.clone()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_compute() {
        let mut registry = MetricRegistry::<Vec<u8>>::new();
        registry
            .register("output_len", "bytes", |v: &Vec<u8>| v.len() as f64)
            .unwrap();
        registry
            .register("half_len", "bytes", |v: &Vec<u8>| v.len() as f64 / 2.0)
            .unwrap();

        let values = registry.compute(&vec![0u8; 10]);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].0, "output_len");
        assert_eq!(values[0].1, MetricValue::new(10.0, "bytes"));
        assert_eq!(values[1].1, MetricValue::new(5.0, "bytes"));
    }

    #[test]
    fn test_duplicate_name_is_refused() {
        let mut registry = MetricRegistry::<()>::new();
        registry.register("m", "unitless", |_| 1.0).unwrap();
        let err = registry.register("m", "unitless", |_| 2.0).unwrap_err();
        assert!(matches!(err, Error::DuplicateMetric(name) if name == "m"));
        assert_eq!(registry.len(), 1);
    }
}
