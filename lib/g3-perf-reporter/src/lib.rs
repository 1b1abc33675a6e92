/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::PerfExportError;

mod config;
pub use config::PerfReporterConfig;

mod adapter;
pub use adapter::{CounterAdapter, ExportedMetric, GaugeAdapter, TimerAdapter};

mod export;
pub use export::{ExportRegistry, Registered};

mod reporter;
pub use reporter::{PerfReporter, ReporterState};
