/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use g3_metrics::{Metric, MetricKind, MetricName};
use g3_perf_data::{FieldSlot, SlotFacility};

use crate::{PerfExportError, PerfReporterConfig};

mod builder;
use builder::SlotSetBuilder;

mod counter;
pub use counter::CounterAdapter;

mod gauge;
pub use gauge::GaugeAdapter;

mod timer;
pub use timer::TimerAdapter;

/// The slot set of one exported metric.
pub enum ExportedMetric {
    Counter(CounterAdapter),
    Gauge(GaugeAdapter),
    Timer(TimerAdapter),
}

impl ExportedMetric {
    /// Allocate and initialize the slots for `metric`.
    ///
    /// Nothing is returned unless every slot of the metric got allocated.
    pub fn build(
        facility: &dyn SlotFacility,
        config: &PerfReporterConfig,
        name: &MetricName,
        metric: &Metric,
    ) -> Result<Self, PerfExportError> {
        let builder = SlotSetBuilder::new(facility, config, name);
        match metric {
            Metric::Counter(c) => CounterAdapter::build(&builder, c).map(ExportedMetric::Counter),
            Metric::Gauge(g) => GaugeAdapter::build(&builder, g).map(ExportedMetric::Gauge),
            Metric::Timer(t) => TimerAdapter::build(&builder, t).map(ExportedMetric::Timer),
            Metric::Meter(_) | Metric::Histogram(_) => Err(PerfExportError::UnsupportedMetricKind {
                name: name.clone(),
                kind: metric.kind(),
            }),
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            ExportedMetric::Counter(_) => MetricKind::Counter,
            ExportedMetric::Gauge(_) => MetricKind::Gauge,
            ExportedMetric::Timer(_) => MetricKind::Timer,
        }
    }

    /// Write the current values of `metric` to the slots.
    ///
    /// Returns false if `metric` is not of the exported kind.
    pub fn refresh(&self, metric: &Metric) -> bool {
        match (self, metric) {
            (ExportedMetric::Counter(a), Metric::Counter(c)) => a.refresh(c),
            (ExportedMetric::Gauge(a), Metric::Gauge(g)) => a.refresh(g),
            (ExportedMetric::Timer(a), Metric::Timer(t)) => a.refresh(t),
            _ => return false,
        }
        true
    }

    pub fn slots(&self) -> Vec<&FieldSlot> {
        match self {
            ExportedMetric::Counter(a) => a.slots(),
            ExportedMetric::Gauge(a) => a.slots(),
            ExportedMetric::Timer(a) => a.slots(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.slots().len()
    }
}
