/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod name;
pub use name::MetricName;

mod counter;
pub use counter::Counter;

mod gauge;
pub use gauge::{Gauge, GaugeValue};

mod ewma;

mod meter;
pub use meter::Meter;

mod histogram;
pub use histogram::{Histogram, HistogramValues, Snapshot};

mod timer;
pub use timer::Timer;

mod metric;
pub use metric::{Metric, MetricKind};

mod registry;
pub use registry::{MetricsError, MetricsRegistry, MetricsRegistryListener};
