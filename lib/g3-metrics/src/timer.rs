/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::{Duration, Instant};

use crate::{Histogram, HistogramValues, Meter, Snapshot};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Duration distribution plus the rate of timed events.
///
/// Durations are reported in milliseconds, rates in events per second.
#[derive(Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    pub fn new() -> Self {
        Timer::default()
    }

    pub fn update(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.histogram.update(nanos);
        self.meter.mark(1);
    }

    pub fn time<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let r = f();
        self.update(start.elapsed());
        r
    }

    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// count, min, max, sum, mean and standard deviation, in milliseconds
    pub fn values(&self) -> HistogramValues {
        self.histogram.values_in_unit(NANOS_PER_MILLI)
    }

    pub fn min(&self) -> f64 {
        self.values().min
    }

    pub fn max(&self) -> f64 {
        self.values().max
    }

    pub fn mean(&self) -> f64 {
        self.values().mean
    }

    pub fn sum(&self) -> f64 {
        self.values().sum
    }

    pub fn std_dev(&self) -> f64 {
        self.values().std_dev
    }

    pub fn mean_rate(&self) -> f64 {
        self.meter.mean_rate()
    }

    pub fn one_minute_rate(&self) -> f64 {
        self.meter.one_minute_rate()
    }

    pub fn five_minute_rate(&self) -> f64 {
        self.meter.five_minute_rate()
    }

    pub fn fifteen_minute_rate(&self) -> f64 {
        self.meter.fifteen_minute_rate()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.histogram.snapshot().in_unit(NANOS_PER_MILLI)
    }
}
