/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use g3_metrics::{HistogramValues, Snapshot, Timer};
use g3_perf_data::{FieldSlot, SlotValue, SlotValueKind, Units, Variability};

use super::SlotSetBuilder;
use crate::PerfExportError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerField {
    Count,
    Min,
    Max,
    Mean,
    Sum,
    StdDev,
    MeanRate,
    OneMinuteRate,
    FiveMinuteRate,
    FifteenMinuteRate,
    Median,
    P75,
    P95,
    P98,
    P99,
    P999,
}

impl TimerField {
    const ALL: [TimerField; 16] = [
        TimerField::Count,
        TimerField::Min,
        TimerField::Max,
        TimerField::Mean,
        TimerField::Sum,
        TimerField::StdDev,
        TimerField::MeanRate,
        TimerField::OneMinuteRate,
        TimerField::FiveMinuteRate,
        TimerField::FifteenMinuteRate,
        TimerField::Median,
        TimerField::P75,
        TimerField::P95,
        TimerField::P98,
        TimerField::P99,
        TimerField::P999,
    ];

    const fn suffix(&self) -> &'static str {
        match self {
            TimerField::Count => "count",
            TimerField::Min => "min",
            TimerField::Max => "max",
            TimerField::Mean => "mean",
            TimerField::Sum => "sum",
            TimerField::StdDev => "std-dev",
            TimerField::MeanRate => "mean-rate",
            TimerField::OneMinuteRate => "1-min-rate",
            TimerField::FiveMinuteRate => "5-min-rate",
            TimerField::FifteenMinuteRate => "15-min-rate",
            TimerField::Median => "snapshot.median",
            TimerField::P75 => "snapshot.75th",
            TimerField::P95 => "snapshot.95th",
            TimerField::P98 => "snapshot.98th",
            TimerField::P99 => "snapshot.99th",
            TimerField::P999 => "snapshot.999th",
        }
    }

    const fn variability(&self) -> Variability {
        match self {
            TimerField::Count => Variability::Monotonic,
            _ => Variability::Variable,
        }
    }

    const fn units(&self) -> Units {
        match self {
            TimerField::Count => Units::Events,
            TimerField::MeanRate
            | TimerField::OneMinuteRate
            | TimerField::FiveMinuteRate
            | TimerField::FifteenMinuteRate => Units::Hertz,
            _ => Units::Ticks,
        }
    }
}

/// All values of a timer, read once per refresh.
struct TimerSample {
    values: HistogramValues,
    mean_rate: f64,
    m1_rate: f64,
    m5_rate: f64,
    m15_rate: f64,
    snapshot: Snapshot,
}

impl TimerSample {
    fn take(timer: &Timer) -> Self {
        TimerSample {
            values: timer.values(),
            mean_rate: timer.mean_rate(),
            m1_rate: timer.one_minute_rate(),
            m5_rate: timer.five_minute_rate(),
            m15_rate: timer.fifteen_minute_rate(),
            snapshot: timer.snapshot(),
        }
    }

    fn get(&self, field: TimerField) -> SlotValue {
        let v = match field {
            TimerField::Count => return SlotValue::from(self.values.count),
            TimerField::Min => self.values.min,
            TimerField::Max => self.values.max,
            TimerField::Mean => self.values.mean,
            TimerField::Sum => self.values.sum,
            TimerField::StdDev => self.values.std_dev,
            TimerField::MeanRate => self.mean_rate,
            TimerField::OneMinuteRate => self.m1_rate,
            TimerField::FiveMinuteRate => self.m5_rate,
            TimerField::FifteenMinuteRate => self.m15_rate,
            TimerField::Median => self.snapshot.median(),
            TimerField::P75 => self.snapshot.p75(),
            TimerField::P95 => self.snapshot.p95(),
            TimerField::P98 => self.snapshot.p98(),
            TimerField::P99 => self.snapshot.p99(),
            TimerField::P999 => self.snapshot.p999(),
        };
        SlotValue::Double(v)
    }
}

/// Export of a timer as 16 slots.
///
/// Durations are in milliseconds and rates in events per second. The count
/// is always a long; every other field uses the configured value kind.
pub struct TimerAdapter {
    // in the order of TimerField::ALL
    slots: Vec<FieldSlot>,
}

impl TimerAdapter {
    pub(crate) fn build(builder: &SlotSetBuilder<'_>, timer: &Timer) -> Result<Self, PerfExportError> {
        let sample = TimerSample::take(timer);
        let mut slots = Vec::with_capacity(TimerField::ALL.len());
        for field in TimerField::ALL {
            let kind = match field {
                TimerField::Count => SlotValueKind::Long,
                _ => builder.value_kind(),
            };
            let slot = builder.field(
                field.suffix(),
                field.variability(),
                field.units(),
                kind,
                sample.get(field),
            )?;
            slots.push(slot);
        }
        Ok(TimerAdapter { slots })
    }

    pub fn refresh(&self, timer: &Timer) {
        let sample = TimerSample::take(timer);
        for (field, slot) in TimerField::ALL.into_iter().zip(&self.slots) {
            slot.write(sample.get(field));
        }
    }

    pub fn slots(&self) -> Vec<&FieldSlot> {
        self.slots.iter().collect()
    }
}
