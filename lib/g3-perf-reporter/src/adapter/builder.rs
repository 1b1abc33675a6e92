/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use g3_metrics::MetricName;
use g3_perf_data::{FieldSlot, SlotFacility, SlotSpec, SlotValue, SlotValueKind, Units, Variability};

use crate::{PerfExportError, PerfReporterConfig};

/// Allocates the slots of one metric, all named under the same base.
///
/// The first failed allocation is returned as an error, and the caller is
/// expected to drop every slot it got so far.
pub(crate) struct SlotSetBuilder<'a> {
    facility: &'a dyn SlotFacility,
    config: &'a PerfReporterConfig,
    metric: &'a MetricName,
    metric_path: String,
}

impl<'a> SlotSetBuilder<'a> {
    pub(crate) fn new(
        facility: &'a dyn SlotFacility,
        config: &'a PerfReporterConfig,
        metric: &'a MetricName,
    ) -> Self {
        SlotSetBuilder {
            facility,
            config,
            metric,
            metric_path: metric.to_string(),
        }
    }

    #[inline]
    pub(crate) fn metric(&self) -> &MetricName {
        self.metric
    }

    /// Value kind of floating point fields.
    #[inline]
    pub(crate) fn value_kind(&self) -> SlotValueKind {
        self.config.value_kind
    }

    pub(crate) fn field<V: Into<SlotValue>>(
        &self,
        suffix: &str,
        variability: Variability,
        units: Units,
        kind: SlotValueKind,
        initial: V,
    ) -> Result<FieldSlot, PerfExportError> {
        let name = self.config.slot_name(&self.metric_path, suffix);
        let spec = SlotSpec::new(name, variability, units, kind).with_initial(initial);
        self.facility
            .allocate(spec)
            .map_err(|source| PerfExportError::AllocationFailure {
                name: self.metric.clone(),
                source,
            })
    }
}
