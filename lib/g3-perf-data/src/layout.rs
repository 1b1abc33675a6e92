/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Binary layout of a perf data area.
//!
//! ```text
//! +----------------------+
//! | header               |  64 bytes
//! +----------------------+
//! | entry 0              |  16 bytes entry header
//! |                      |  name + NUL, padded to 8 bytes
//! |                      |  8 bytes value
//! +----------------------+
//! | entry 1 ...          |
//! +----------------------+
//! ```
//!
//! All integers are in native byte order, the header records which one.
//! Every entry starts, and every value lives, at an 8 bytes aligned offset.

use crate::{SlotError, SlotSpec, SlotValueKind, Units, Variability};

pub(crate) const MAGIC: [u8; 8] = *b"G3PERF\0\0";
pub(crate) const VERSION: u32 = 1;

pub(crate) const HEADER_SIZE: usize = 64;
pub(crate) const ENTRY_HEADER_SIZE: usize = 16;

pub(crate) const OFFSET_USED: usize = 16;
pub(crate) const OFFSET_ENTRY_COUNT: usize = 24;
pub(crate) const OFFSET_CAPACITY: usize = 32;

const BYTE_ORDER_BIG: u8 = 0;
const BYTE_ORDER_LITTLE: u8 = 1;

pub const MAX_NAME_LEN: usize = 255;

#[inline]
pub(crate) const fn align8(n: usize) -> usize {
    (n + 7) & !7
}

const fn native_byte_order() -> u8 {
    if cfg!(target_endian = "little") {
        BYTE_ORDER_LITTLE
    } else {
        BYTE_ORDER_BIG
    }
}

pub(crate) fn encode_header(capacity: usize) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0..8].copy_from_slice(&MAGIC);
    buf[8..12].copy_from_slice(&VERSION.to_ne_bytes());
    buf[12] = native_byte_order();
    buf[OFFSET_USED..OFFSET_USED + 8].copy_from_slice(&(HEADER_SIZE as u64).to_ne_bytes());
    buf[OFFSET_ENTRY_COUNT..OFFSET_ENTRY_COUNT + 8].copy_from_slice(&0u64.to_ne_bytes());
    buf[OFFSET_CAPACITY..OFFSET_CAPACITY + 8].copy_from_slice(&(capacity as u64).to_ne_bytes());
    buf
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EntryLayout {
    /// total length of the entry, including the value
    pub(crate) total_len: usize,
    /// offset of the value, relative to the start of the entry
    pub(crate) value_offset: usize,
}

impl EntryLayout {
    pub(crate) fn for_name(name_len: usize) -> Self {
        let value_offset = ENTRY_HEADER_SIZE + align8(name_len + 1);
        EntryLayout {
            total_len: value_offset + 8,
            value_offset,
        }
    }
}

/// Encode everything but the value of an entry.
pub(crate) fn encode_entry(layout: &EntryLayout, spec: &SlotSpec) -> Vec<u8> {
    let mut buf = vec![0u8; layout.value_offset];
    buf[0..4].copy_from_slice(&(layout.total_len as u32).to_ne_bytes());
    buf[4..6].copy_from_slice(&(spec.name.len() as u16).to_ne_bytes());
    buf[6] = spec.variability.code();
    buf[7] = spec.units.code();
    buf[8] = spec.kind.code();
    buf[ENTRY_HEADER_SIZE..ENTRY_HEADER_SIZE + spec.name.len()]
        .copy_from_slice(spec.name.as_bytes());
    buf
}

pub(crate) struct EntryHeader {
    pub(crate) total_len: usize,
    pub(crate) name_len: usize,
    pub(crate) variability: Option<Variability>,
    pub(crate) units: Option<Units>,
    pub(crate) kind: Option<SlotValueKind>,
}

pub(crate) fn decode_entry_header(buf: &[u8; ENTRY_HEADER_SIZE]) -> EntryHeader {
    let mut len = [0u8; 4];
    len.copy_from_slice(&buf[0..4]);
    let mut name_len = [0u8; 2];
    name_len.copy_from_slice(&buf[4..6]);
    EntryHeader {
        total_len: u32::from_ne_bytes(len) as usize,
        name_len: u16::from_ne_bytes(name_len) as usize,
        variability: Variability::from_code(buf[6]),
        units: Units::from_code(buf[7]),
        kind: SlotValueKind::from_code(buf[8]),
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), SlotError> {
    let invalid = |reason| {
        Err(SlotError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return invalid("empty name");
    }
    if name.len() > MAX_NAME_LEN {
        return invalid("name too long");
    }
    for c in name.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '/' => {}
            _ => return invalid("only ascii alphanumeric and '-', '_', '.', '/' are allowed"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_layout() {
        let l = EntryLayout::for_name(1);
        assert_eq!(l.value_offset, 24);
        assert_eq!(l.total_len, 32);

        let l = EntryLayout::for_name(7);
        assert_eq!(l.value_offset, 24);

        let l = EntryLayout::for_name(8);
        assert_eq!(l.value_offset, 32);
        assert_eq!(l.total_len % 8, 0);
    }

    #[test]
    fn header() {
        let buf = encode_header(4096);
        assert_eq!(&buf[0..8], b"G3PERF\0\0");
        assert_eq!(buf[12], native_byte_order());
        let mut used = [0u8; 8];
        used.copy_from_slice(&buf[OFFSET_USED..OFFSET_USED + 8]);
        assert_eq!(u64::from_ne_bytes(used), HEADER_SIZE as u64);
    }

    #[test]
    fn entry_round_trip() {
        let spec = SlotSpec::new(
            "metric.a.count",
            Variability::Monotonic,
            Units::Events,
            SlotValueKind::Long,
        );
        let layout = EntryLayout::for_name(spec.name.len());
        let buf = encode_entry(&layout, &spec);
        assert_eq!(buf.len(), layout.value_offset);

        let mut head = [0u8; ENTRY_HEADER_SIZE];
        head.copy_from_slice(&buf[..ENTRY_HEADER_SIZE]);
        let h = decode_entry_header(&head);
        assert_eq!(h.total_len, layout.total_len);
        assert_eq!(h.name_len, spec.name.len());
        assert_eq!(h.variability, Some(Variability::Monotonic));
        assert_eq!(h.units, Some(Units::Events));
        assert_eq!(h.kind, Some(SlotValueKind::Long));
        assert_eq!(
            &buf[ENTRY_HEADER_SIZE..ENTRY_HEADER_SIZE + h.name_len],
            spec.name.as_bytes()
        );
        assert_eq!(buf[ENTRY_HEADER_SIZE + h.name_len], 0);
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("metric.requests.count").is_ok());
        assert!(validate_name("metric.a-b_c/d.1-min-rate").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("metric.with space").is_err());
        assert!(validate_name("metric.é").is_err());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }
}
