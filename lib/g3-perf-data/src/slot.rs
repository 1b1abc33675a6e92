/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::area::MappedArea;
use crate::{SlotValue, SlotValueKind, Units, Variability};

/// Everything a facility needs to allocate one slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotSpec {
    pub name: String,
    pub variability: Variability,
    pub units: Units,
    pub kind: SlotValueKind,
    pub initial: SlotValue,
}

impl SlotSpec {
    pub fn new<T: Into<String>>(
        name: T,
        variability: Variability,
        units: Units,
        kind: SlotValueKind,
    ) -> Self {
        SlotSpec {
            name: name.into(),
            variability,
            units,
            kind,
            initial: SlotValue::default(),
        }
    }

    pub fn with_initial<V: Into<SlotValue>>(mut self, value: V) -> Self {
        self.initial = value.into();
        self
    }
}

/// One exported 64-bit value.
///
/// The value is always stored by a single atomic 64-bit store in native byte
/// order, so a concurrent reader sees either the old or the new value. There
/// is no read cursor: the value sits at a fixed offset and every read starts
/// from its first byte.
pub struct FieldSlot {
    name: String,
    variability: Variability,
    units: Units,
    kind: SlotValueKind,
    area: Arc<MappedArea>,
    offset: usize,
}

impl FieldSlot {
    pub(crate) fn new(spec: SlotSpec, area: Arc<MappedArea>, offset: usize) -> Self {
        let slot = FieldSlot {
            name: spec.name,
            variability: spec.variability,
            units: spec.units,
            kind: spec.kind,
            area,
            offset,
        };
        slot.write(spec.initial);
        slot
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn variability(&self) -> Variability {
        self.variability
    }

    #[inline]
    pub fn units(&self) -> Units {
        self.units
    }

    #[inline]
    pub fn kind(&self) -> SlotValueKind {
        self.kind
    }

    pub fn write<V: Into<SlotValue>>(&self, value: V) {
        let bits = value.into().to_bits(self.kind);
        self.area
            .atomic_u64(self.offset)
            .store(bits, Ordering::Release);
    }

    pub fn read(&self) -> SlotValue {
        SlotValue::from_bits(self.load_bits(), self.kind)
    }

    /// The stored bytes, in native byte order.
    pub fn read_raw(&self) -> [u8; 8] {
        self.load_bits().to_ne_bytes()
    }

    fn load_bits(&self) -> u64 {
        self.area.atomic_u64(self.offset).load(Ordering::Acquire)
    }
}

impl fmt::Debug for FieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSlot")
            .field("name", &self.name)
            .field("variability", &self.variability)
            .field("units", &self.units)
            .field("kind", &self.kind)
            .field("value", &self.read())
            .finish()
    }
}
