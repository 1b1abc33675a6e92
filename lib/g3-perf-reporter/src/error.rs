/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use log::Level;
use thiserror::Error;

use g3_metrics::{MetricKind, MetricName};
use g3_perf_data::SlotError;

#[derive(Debug, Error)]
pub enum PerfExportError {
    #[error("perf data export is not supported: {0}")]
    PlatformUnsupported(String),
    #[error("metric {name} of kind {kind} can not be exported")]
    UnsupportedMetricKind { name: MetricName, kind: MetricKind },
    #[error("gauge {0} has no numeric value")]
    NonNumericValue(MetricName),
    #[error("failed to allocate slot for metric {name}: {source}")]
    AllocationFailure {
        name: MetricName,
        #[source]
        source: SlotError,
    },
    #[error("no export entry found for metric {0}")]
    MissingExportEntry(MetricName),
    #[error("failed to spawn perf reporter thread: {0}")]
    WorkerSpawn(#[source] io::Error),
}

impl PerfExportError {
    /// The log level this error should be reported at.
    pub fn severity(&self) -> Level {
        match self {
            PerfExportError::PlatformUnsupported(_) => Level::Warn,
            PerfExportError::UnsupportedMetricKind { .. } => Level::Info,
            PerfExportError::NonNumericValue(_) => Level::Debug,
            PerfExportError::AllocationFailure { .. } => Level::Warn,
            PerfExportError::MissingExportEntry(_) => Level::Warn,
            PerfExportError::WorkerSpawn(_) => Level::Error,
        }
    }
}
