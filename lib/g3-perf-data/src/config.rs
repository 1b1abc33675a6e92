/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};

use crate::{PerfData, SlotError};

const DEFAULT_CAPACITY: usize = 64 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerfDataConfig {
    path: Option<PathBuf>,
    capacity: usize,
}

impl Default for PerfDataConfig {
    fn default() -> Self {
        PerfDataConfig {
            path: None,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl PerfDataConfig {
    /// Use a file mapping at `path` instead of an anonymous one.
    pub fn set_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(any(unix, windows))]
    pub fn build(&self) -> Result<PerfData, SlotError> {
        match &self.path {
            Some(path) => PerfData::create_file(path, self.capacity),
            None => PerfData::anonymous(self.capacity),
        }
    }

    #[cfg(not(any(unix, windows)))]
    pub fn build(&self) -> Result<PerfData, SlotError> {
        Err(SlotError::Unavailable(
            "memory mapping is not supported on this platform".to_string(),
        ))
    }
}
