// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The timing primitive behind the runner.
//!
//! The runner needs exactly two operations from its timer — read it, know
//! its granularity — so that is the whole interface. Tests substitute a
//! scripted clock to make round counts and calibration outcomes exact.

use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Current reading, measured from an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Smallest reliably observable nonzero tick.
    fn resolution(&self) -> Duration;
}

/// Production clock wrapping [`std::time::Instant`].
///
/// Resolution is measured once at construction by timing the shortest
/// observable tick.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
    resolution: Duration,
}

impl MonotonicClock {
    /// Create a clock and measure its resolution.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            resolution: measure_resolution(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn resolution(&self) -> Duration {
        self.resolution
    }
}

fn measure_resolution() -> Duration {
    let mut best = Duration::from_millis(1);
    for _ in 0..10 {
        let start = Instant::now();
        let mut end = Instant::now();
        while end == start {
            end = Instant::now();
        }
        best = best.min(end - start);
    }
    best.max(Duration::from_nanos(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.now() > first);
    }

    #[test]
    fn test_resolution_is_nonzero_and_sane() {
        let clock = MonotonicClock::new();
        assert!(clock.resolution() > Duration::ZERO);
        assert!(clock.resolution() <= Duration::from_millis(1));
    }
}
