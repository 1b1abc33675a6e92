/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Mutex;

use hdrhistogram::CreationError;

/// Exact running statistics of a histogram.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HistogramValues {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl HistogramValues {
    fn in_unit(mut self, unit: f64) -> Self {
        self.min /= unit;
        self.max /= unit;
        self.sum /= unit;
        self.mean /= unit;
        self.std_dev /= unit;
        self
    }
}

/// Point in time copy of the distribution, for quantile queries.
#[derive(Clone)]
pub struct Snapshot {
    inner: hdrhistogram::Histogram<u64>,
    unit: f64,
}

impl Snapshot {
    pub fn value(&self, quantile: f64) -> f64 {
        if self.inner.is_empty() {
            return 0.0;
        }
        self.inner.value_at_quantile(quantile) as f64 / self.unit
    }

    #[inline]
    pub fn median(&self) -> f64 {
        self.value(0.5)
    }

    #[inline]
    pub fn p75(&self) -> f64 {
        self.value(0.75)
    }

    #[inline]
    pub fn p95(&self) -> f64 {
        self.value(0.95)
    }

    #[inline]
    pub fn p98(&self) -> f64 {
        self.value(0.98)
    }

    #[inline]
    pub fn p99(&self) -> f64 {
        self.value(0.99)
    }

    #[inline]
    pub fn p999(&self) -> f64 {
        self.value(0.999)
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Report values divided by `unit`.
    pub(crate) fn in_unit(mut self, unit: f64) -> Self {
        self.unit = unit;
        self
    }
}

struct HistogramState {
    hdr: hdrhistogram::Histogram<u64>,
    count: u64,
    min: u64,
    max: u64,
    sum: u64,
    mean: f64,
    m2: f64,
}

impl HistogramState {
    fn record(&mut self, v: u64) {
        // out of range values are clamped, so the quantiles see every value
        self.hdr.saturating_record(v);
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.count += 1;
        self.sum = self.sum.saturating_add(v);

        // Welford's online variance
        let delta = v as f64 - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v as f64 - self.mean);
    }

    fn values(&self) -> HistogramValues {
        if self.count == 0 {
            return HistogramValues::default();
        }
        let std_dev = if self.count > 1 {
            (self.m2 / (self.count - 1) as f64).sqrt()
        } else {
            0.0
        };
        HistogramValues {
            count: self.count,
            min: self.min as f64,
            max: self.max as f64,
            sum: self.sum as f64,
            mean: self.sum as f64 / self.count as f64,
            std_dev,
        }
    }

    fn clear(&mut self) {
        self.hdr.reset();
        self.count = 0;
        self.min = 0;
        self.max = 0;
        self.sum = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
    }
}

/// Distribution of recorded values, kept for the whole life of the metric.
pub struct Histogram {
    state: Mutex<HistogramState>,
}

impl Default for Histogram {
    fn default() -> Self {
        Histogram::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Histogram::with_sigfig(3).unwrap()
    }

    pub fn with_sigfig(sigfig: u8) -> Result<Self, CreationError> {
        let hdr = hdrhistogram::Histogram::new(sigfig)?;
        Ok(Histogram {
            state: Mutex::new(HistogramState {
                hdr,
                count: 0,
                min: 0,
                max: 0,
                sum: 0,
                mean: 0.0,
                m2: 0.0,
            }),
        })
    }

    pub fn update(&self, v: u64) {
        let mut state = self.state.lock().unwrap();
        state.record(v);
    }

    pub fn count(&self) -> u64 {
        self.state.lock().unwrap().count
    }

    /// All running statistics, read consistently.
    pub fn values(&self) -> HistogramValues {
        self.state.lock().unwrap().values()
    }

    pub(crate) fn values_in_unit(&self, unit: f64) -> HistogramValues {
        self.values().in_unit(unit)
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock().unwrap();
        Snapshot {
            inner: state.hdr.clone(),
            unit: 1.0,
        }
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().clear();
    }
}
