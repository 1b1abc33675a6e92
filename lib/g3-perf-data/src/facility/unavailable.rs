/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::SlotFacility;
use crate::{FieldSlot, SlotError, SlotSpec};

/// Stand-in facility for platforms or processes where export is disabled.
#[derive(Clone, Debug)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new<T: Into<String>>(reason: T) -> Self {
        Unavailable {
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl SlotFacility for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn allocate(&self, _spec: SlotSpec) -> Result<FieldSlot, SlotError> {
        Err(SlotError::Unavailable(self.reason.clone()))
    }
}
