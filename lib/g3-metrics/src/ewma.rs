/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use portable_atomic::AtomicF64;

pub(crate) const TICK_INTERVAL_SECS: u64 = 5;

/// Exponentially weighted moving average of a rate, in events per second.
pub(crate) struct Ewma {
    alpha: f64,
    uncounted: AtomicU64,
    rate: AtomicF64,
    initialized: AtomicBool,
}

impl Ewma {
    pub(crate) fn with_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-(TICK_INTERVAL_SECS as f64) / 60.0 / minutes).exp();
        Ewma {
            alpha,
            uncounted: AtomicU64::new(0),
            rate: AtomicF64::new(0.0),
            initialized: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn update(&self, n: u64) {
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Meant to be called once every tick interval, by a single thread.
    pub(crate) fn tick(&self) {
        let count = self.uncounted.swap(0, Ordering::Relaxed);
        let instant_rate = count as f64 / TICK_INTERVAL_SECS as f64;
        if self.initialized.load(Ordering::Relaxed) {
            let rate = self.rate.load(Ordering::Relaxed);
            self.rate
                .store(rate + self.alpha * (instant_rate - rate), Ordering::Relaxed);
        } else {
            self.rate.store(instant_rate, Ordering::Relaxed);
            self.initialized.store(true, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn rate(&self) -> f64 {
        self.rate.load(Ordering::Relaxed)
    }
}
