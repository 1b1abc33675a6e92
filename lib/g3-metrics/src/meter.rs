/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::ewma::{Ewma, TICK_INTERVAL_SECS};

const TICK_INTERVAL_NANOS: u64 = TICK_INTERVAL_SECS * 1_000_000_000;

/// Rate of events, since creation and over 1, 5 and 15 minutes.
pub struct Meter {
    count: AtomicU64,
    m1_rate: Ewma,
    m5_rate: Ewma,
    m15_rate: Ewma,
    start: Instant,
    last_tick: AtomicU64,
}

impl Default for Meter {
    fn default() -> Self {
        Meter::new()
    }
}

impl Meter {
    pub fn new() -> Self {
        Meter {
            count: AtomicU64::new(0),
            m1_rate: Ewma::with_minutes(1.0),
            m5_rate: Ewma::with_minutes(5.0),
            m15_rate: Ewma::with_minutes(15.0),
            start: Instant::now(),
            last_tick: AtomicU64::new(0),
        }
    }

    pub fn mark(&self, n: u64) {
        self.tick_if_necessary(self.start.elapsed());
        self.count.fetch_add(n, Ordering::Relaxed);
        self.m1_rate.update(n);
        self.m5_rate.update(n);
        self.m15_rate.update(n);
    }

    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            0.0
        } else {
            count as f64 / elapsed
        }
    }

    pub fn one_minute_rate(&self) -> f64 {
        self.tick_if_necessary(self.start.elapsed());
        self.m1_rate.rate()
    }

    pub fn five_minute_rate(&self) -> f64 {
        self.tick_if_necessary(self.start.elapsed());
        self.m5_rate.rate()
    }

    pub fn fifteen_minute_rate(&self) -> f64 {
        self.tick_if_necessary(self.start.elapsed());
        self.m15_rate.rate()
    }

    fn tick_if_necessary(&self, elapsed: Duration) {
        let old_tick = self.last_tick.load(Ordering::Acquire);
        let now = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        let age = now.saturating_sub(old_tick);
        if age < TICK_INTERVAL_NANOS {
            return;
        }

        let new_tick = now - age % TICK_INTERVAL_NANOS;
        // only the winner runs the pending ticks
        if self
            .last_tick
            .compare_exchange(old_tick, new_tick, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            for _ in 0..age / TICK_INTERVAL_NANOS {
                self.m1_rate.tick();
                self.m5_rate.tick();
                self.m15_rate.tick();
            }
        }
    }
}
