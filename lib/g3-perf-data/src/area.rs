/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fs::File;
use std::io;
use std::sync::atomic::AtomicU64;

use memmap2::{MmapMut, MmapOptions};

/// A fixed size writable mapping that never moves until drop.
pub(crate) struct MappedArea {
    mmap: MmapMut,
    base: *mut u8,
    len: usize,
}

// SAFETY: the mapping is allocated once and never remapped. Bytes of an
// entry are only copied in before the entry is published, with the allocator
// lock held, and every published value is only accessed through AtomicU64.
unsafe impl Send for MappedArea {}
unsafe impl Sync for MappedArea {}

impl MappedArea {
    pub(crate) fn anonymous(len: usize) -> io::Result<Self> {
        let mmap = MmapMut::map_anon(len)?;
        Ok(MappedArea::from_mmap(mmap))
    }

    pub(crate) fn file(file: &File, len: usize) -> io::Result<Self> {
        file.set_len(len as u64)?;
        // SAFETY: the file is created and truncated by us, external readers
        // only ever map it read-only
        let mmap = unsafe { MmapOptions::new().len(len).map_mut(file)? };
        Ok(MappedArea::from_mmap(mmap))
    }

    fn from_mmap(mut mmap: MmapMut) -> Self {
        let base = mmap.as_mut_ptr();
        let len = mmap.len();
        MappedArea { mmap, base, len }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Copy `bytes` into the area at `offset`.
    ///
    /// # Safety
    ///
    /// The target range must not be accessed by anyone else at the same time,
    /// which holds for unpublished entries while the allocator lock is taken.
    pub(crate) unsafe fn write_bytes(&self, offset: usize, bytes: &[u8]) {
        assert!(offset + bytes.len() <= self.len);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.base.add(offset), bytes.len());
        }
    }

    /// Copy `buf.len()` bytes out of the area at `offset`.
    ///
    /// # Safety
    ///
    /// The source range must be immutable, which holds for the header part
    /// of every published entry.
    pub(crate) unsafe fn read_bytes(&self, offset: usize, buf: &mut [u8]) {
        assert!(offset + buf.len() <= self.len);
        unsafe {
            std::ptr::copy_nonoverlapping(self.base.add(offset), buf.as_mut_ptr(), buf.len());
        }
    }

    pub(crate) fn atomic_u64(&self, offset: usize) -> &AtomicU64 {
        assert_eq!(offset % 8, 0, "unaligned slot offset {offset}");
        assert!(offset + 8 <= self.len);
        // SAFETY: the mapping is page aligned, so an 8 bytes aligned offset
        // within bounds is a valid location for an AtomicU64 for our lifetime
        unsafe { &*(self.base.add(offset) as *const AtomicU64) }
    }

    pub(crate) fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn anonymous_atomic() {
        let area = MappedArea::anonymous(4096).unwrap();
        assert_eq!(area.len(), 4096);
        unsafe { area.write_bytes(0, &[1, 2, 3, 4]) };
        let mut buf = [0u8; 4];
        unsafe { area.read_bytes(0, &mut buf) };
        assert_eq!(buf, [1, 2, 3, 4]);

        area.atomic_u64(8).store(42, Ordering::Release);
        assert_eq!(area.atomic_u64(8).load(Ordering::Acquire), 42);
    }

    #[test]
    #[should_panic]
    fn unaligned_atomic() {
        let area = MappedArea::anonymous(4096).unwrap();
        let _ = area.atomic_u64(4);
    }
}
