/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use foldhash::fast::FixedState;

use super::SlotFacility;
use crate::area::MappedArea;
use crate::layout::{self, ENTRY_HEADER_SIZE, EntryLayout, HEADER_SIZE};
use crate::{FieldSlot, SlotError, SlotSpec, SlotValue, SlotValueKind, Units, Variability};

struct AllocState {
    used: usize,
    names: HashSet<String, FixedState>,
}

/// Slot facility over a single memory mapping.
///
/// With a file the mapping is shared with every process that maps the same
/// file, otherwise it is an anonymous in-process mapping.
pub struct PerfData {
    area: Arc<MappedArea>,
    path: Option<PathBuf>,
    _file: Option<File>,
    alloc: Mutex<AllocState>,
}

/// A decoded published entry.
#[derive(Clone, Debug, PartialEq)]
pub struct PerfDataEntry {
    pub name: String,
    pub variability: Variability,
    pub units: Units,
    pub value: SlotValue,
}

impl PerfData {
    pub fn anonymous(capacity: usize) -> Result<Self, SlotError> {
        let capacity = check_capacity(capacity)?;
        let area = MappedArea::anonymous(capacity)?;
        Ok(PerfData::with_area(area, None, None))
    }

    pub fn create_file<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, SlotError> {
        let capacity = check_capacity(capacity)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let area = MappedArea::file(&file, capacity)?;
        Ok(PerfData::with_area(
            area,
            Some(path.to_path_buf()),
            Some(file),
        ))
    }

    fn with_area(area: MappedArea, path: Option<PathBuf>, file: Option<File>) -> Self {
        let header = layout::encode_header(area.len());
        // SAFETY: the area is not shared with anyone yet
        unsafe { area.write_bytes(0, &header) };
        PerfData {
            area: Arc::new(area),
            path,
            _file: file,
            alloc: Mutex::new(AllocState {
                used: HEADER_SIZE,
                names: HashSet::with_hasher(FixedState::with_seed(0)),
            }),
        }
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.area.len()
    }

    pub fn used(&self) -> usize {
        self.area
            .atomic_u64(layout::OFFSET_USED)
            .load(Ordering::Acquire) as usize
    }

    pub fn entry_count(&self) -> usize {
        self.area
            .atomic_u64(layout::OFFSET_ENTRY_COUNT)
            .load(Ordering::Acquire) as usize
    }

    /// Decode all published entries, the way an external reader would.
    pub fn entries(&self) -> Vec<PerfDataEntry> {
        let used = self.used();
        let mut entries = Vec::with_capacity(self.entry_count());
        let mut offset = HEADER_SIZE;
        while offset + ENTRY_HEADER_SIZE <= used {
            let mut head = [0u8; ENTRY_HEADER_SIZE];
            // SAFETY: published entry headers are never written again
            unsafe { self.area.read_bytes(offset, &mut head) };
            let h = layout::decode_entry_header(&head);
            let entry = EntryLayout::for_name(h.name_len);
            if h.total_len != entry.total_len || offset + entry.total_len > used {
                break;
            }
            let (Some(variability), Some(units), Some(kind)) = (h.variability, h.units, h.kind)
            else {
                break;
            };

            let mut name = vec![0u8; h.name_len];
            // SAFETY: same as above, the name is part of the entry header
            unsafe {
                self.area
                    .read_bytes(offset + ENTRY_HEADER_SIZE, &mut name)
            };
            let bits = self
                .area
                .atomic_u64(offset + entry.value_offset)
                .load(Ordering::Acquire);
            entries.push(PerfDataEntry {
                name: String::from_utf8_lossy(&name).into_owned(),
                variability,
                units,
                value: SlotValue::from_bits(bits, kind),
            });
            offset += entry.total_len;
        }
        entries
    }

    pub fn flush(&self) -> Result<(), SlotError> {
        if self.path.is_some() {
            self.area.flush()?;
        }
        Ok(())
    }
}

fn check_capacity(capacity: usize) -> Result<usize, SlotError> {
    let min = HEADER_SIZE + EntryLayout::for_name(1).total_len;
    let aligned = capacity & !7;
    if aligned < min || u32::try_from(aligned).is_err() {
        Err(SlotError::InvalidCapacity(capacity))
    } else {
        Ok(aligned)
    }
}

impl SlotFacility for PerfData {
    fn is_available(&self) -> bool {
        true
    }

    fn allocate(&self, spec: SlotSpec) -> Result<FieldSlot, SlotError> {
        layout::validate_name(&spec.name)?;
        let entry = EntryLayout::for_name(spec.name.len());

        let mut state = self.alloc.lock().unwrap();
        if state.names.contains(&spec.name) {
            return Err(SlotError::DuplicateName(spec.name));
        }
        let available = self.area.len() - state.used;
        if entry.total_len > available {
            return Err(SlotError::Exhausted {
                name: spec.name,
                requested: entry.total_len,
                available,
            });
        }

        let offset = state.used;
        let head = layout::encode_entry(&entry, &spec);
        // SAFETY: the range is beyond the published part and we hold the lock
        unsafe { self.area.write_bytes(offset, &head) };

        let name = spec.name.clone();
        let slot = FieldSlot::new(spec, Arc::clone(&self.area), offset + entry.value_offset);

        state.used += entry.total_len;
        state.names.insert(name);
        self.area
            .atomic_u64(layout::OFFSET_ENTRY_COUNT)
            .fetch_add(1, Ordering::Release);
        self.area
            .atomic_u64(layout::OFFSET_USED)
            .store(state.used as u64, Ordering::Release);
        Ok(slot)
    }
}

impl Drop for PerfData {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_spec(name: &str, initial: i64) -> SlotSpec {
        SlotSpec::new(
            name,
            Variability::Monotonic,
            Units::Events,
            SlotValueKind::Long,
        )
        .with_initial(initial)
    }

    #[test]
    fn allocate_and_decode() {
        let perf = PerfData::anonymous(4096).unwrap();
        assert!(perf.is_available());
        assert_eq!(perf.entry_count(), 0);
        assert_eq!(perf.used(), HEADER_SIZE);

        let count = perf.allocate(long_spec("metric.requests.count", 3)).unwrap();
        let mean = perf
            .allocate(
                SlotSpec::new(
                    "metric.latency.mean",
                    Variability::Variable,
                    Units::Ticks,
                    SlotValueKind::Double,
                )
                .with_initial(2.5),
            )
            .unwrap();
        assert_eq!(perf.entry_count(), 2);

        count.write(5i64);
        let entries = perf.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "metric.requests.count");
        assert_eq!(entries[0].variability, Variability::Monotonic);
        assert_eq!(entries[0].units, Units::Events);
        assert_eq!(entries[0].value, SlotValue::Long(5));
        assert_eq!(entries[1].name, "metric.latency.mean");
        assert_eq!(entries[1].value, SlotValue::Double(2.5));
        assert_eq!(mean.read(), SlotValue::Double(2.5));
    }

    #[test]
    fn duplicate_name() {
        let perf = PerfData::anonymous(4096).unwrap();
        perf.allocate(long_spec("metric.a.count", 0)).unwrap();
        let r = perf.allocate(long_spec("metric.a.count", 0));
        assert!(matches!(r, Err(SlotError::DuplicateName(_))));
        assert_eq!(perf.entry_count(), 1);
    }

    #[test]
    fn invalid_name() {
        let perf = PerfData::anonymous(4096).unwrap();
        let r = perf.allocate(long_spec("metric.bad name.count", 0));
        assert!(matches!(r, Err(SlotError::InvalidName { .. })));
        assert_eq!(perf.used(), HEADER_SIZE);
    }

    #[test]
    fn exhausted() {
        let perf = PerfData::anonymous(HEADER_SIZE + 64).unwrap();
        // 32 bytes for each entry with a name of up to 7 bytes
        perf.allocate(long_spec("m.a.cnt", 0)).unwrap();
        perf.allocate(long_spec("m.b.cnt", 0)).unwrap();
        let r = perf.allocate(long_spec("m.c.cnt", 0));
        assert!(matches!(r, Err(SlotError::Exhausted { .. })));
        assert_eq!(perf.entries().len(), 2);
    }

    #[test]
    fn invalid_capacity() {
        assert!(matches!(
            PerfData::anonymous(16),
            Err(SlotError::InvalidCapacity(16))
        ));
        let perf = PerfData::anonymous(4099).unwrap();
        assert_eq!(perf.capacity(), 4096);
    }

    #[test]
    fn file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("g3perf.data");
        let perf = PerfData::create_file(&path, 4096).unwrap();
        assert_eq!(perf.path(), Some(path.as_path()));

        let slot = perf.allocate(long_spec("metric.requests.count", 0)).unwrap();
        slot.write(5i64);
        perf.flush().unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 4096);
        assert_eq!(&data[0..8], b"G3PERF\0\0");
        let value_offset = HEADER_SIZE + EntryLayout::for_name(slot.name().len()).value_offset;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&data[value_offset..value_offset + 8]);
        assert_eq!(i64::from_ne_bytes(raw), 5);
    }
}
