/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use g3_metrics::{Gauge, GaugeValue};
use g3_perf_data::{FieldSlot, SlotValue, SlotValueKind, Units, Variability};

use super::SlotSetBuilder;
use crate::PerfExportError;

fn numeric(v: &GaugeValue) -> Option<SlotValue> {
    match v {
        GaugeValue::Signed(i) => Some(SlotValue::Long(*i)),
        GaugeValue::Unsigned(u) => Some(SlotValue::from(*u)),
        GaugeValue::Double(f) => Some(SlotValue::Double(*f)),
        GaugeValue::Text(_) | GaugeValue::Absent => None,
    }
}

/// Export of a numeric gauge.
///
/// The slot kind is chosen from the value seen at build time: long for
/// integers, the configured kind for floating point values. Later values are
/// coerced to that kind, and non-numeric ones leave the slot unchanged.
pub struct GaugeAdapter {
    value: FieldSlot,
}

impl GaugeAdapter {
    pub(crate) fn build(builder: &SlotSetBuilder<'_>, gauge: &Gauge) -> Result<Self, PerfExportError> {
        let Some(initial) = numeric(&gauge.value()) else {
            return Err(PerfExportError::NonNumericValue(builder.metric().clone()));
        };
        let kind = match initial {
            SlotValue::Long(_) => SlotValueKind::Long,
            SlotValue::Double(_) => builder.value_kind(),
        };
        let value = builder.field("value", Variability::Variable, Units::None, kind, initial)?;
        Ok(GaugeAdapter { value })
    }

    pub fn refresh(&self, gauge: &Gauge) {
        if let Some(v) = numeric(&gauge.value()) {
            self.value.write(v);
        }
    }

    pub fn slots(&self) -> Vec<&FieldSlot> {
        vec![&self.value]
    }
}
