/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use log::warn;

use crate::{FieldSlot, PerfDataConfig, SlotError, SlotSpec};

mod perf_data;
pub use perf_data::{PerfData, PerfDataEntry};

mod unavailable;
pub use unavailable::Unavailable;

/// Allocator of named, externally readable 64-bit slots.
pub trait SlotFacility: Send + Sync {
    fn is_available(&self) -> bool;

    /// Allocate and initialize one slot. Failures are not retried.
    fn allocate(&self, spec: SlotSpec) -> Result<FieldSlot, SlotError>;
}

/// Probe and set up the facility for this process.
///
/// This should be called once. If the facility can not be set up, an
/// [`Unavailable`] facility is returned so export stays disabled for
/// everyone holding the handle.
pub fn init(config: &PerfDataConfig) -> Arc<dyn SlotFacility> {
    match config.build() {
        Ok(perf_data) => Arc::new(perf_data),
        Err(e) => {
            warn!("perf data export disabled: {e}");
            Arc::new(Unavailable::new(e.to_string()))
        }
    }
}
