/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use g3_metrics::Counter;
use g3_perf_data::{FieldSlot, SlotValueKind, Units, Variability};

use super::SlotSetBuilder;
use crate::PerfExportError;

pub struct CounterAdapter {
    count: FieldSlot,
}

impl CounterAdapter {
    pub(crate) fn build(
        builder: &SlotSetBuilder<'_>,
        counter: &Counter,
    ) -> Result<Self, PerfExportError> {
        let count = builder.field(
            "count",
            Variability::Monotonic,
            Units::Events,
            SlotValueKind::Long,
            counter.count(),
        )?;
        Ok(CounterAdapter { count })
    }

    pub fn refresh(&self, counter: &Counter) {
        self.count.write(counter.count());
    }

    pub fn slots(&self) -> Vec<&FieldSlot> {
        vec![&self.count]
    }
}
