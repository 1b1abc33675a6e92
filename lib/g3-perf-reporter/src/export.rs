/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use foldhash::fast::FixedState;

use g3_metrics::MetricName;

use crate::{ExportedMetric, PerfExportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    New,
    Existing,
}

/// Map of exported metrics, written at most once per name.
///
/// Entries are built under the map lock, so a lookup never sees a partially
/// built slot set, and entries are never replaced nor removed.
pub struct ExportRegistry {
    inner: Mutex<HashMap<MetricName, Arc<ExportedMetric>, FixedState>>,
}

impl Default for ExportRegistry {
    fn default() -> Self {
        ExportRegistry::new()
    }
}

impl ExportRegistry {
    pub fn new() -> Self {
        ExportRegistry {
            inner: Mutex::new(HashMap::with_hasher(FixedState::with_seed(0))),
        }
    }

    pub fn register_with<F>(&self, name: &MetricName, build: F) -> Result<Registered, PerfExportError>
    where
        F: FnOnce() -> Result<ExportedMetric, PerfExportError>,
    {
        let mut ht = self.inner.lock().unwrap();
        if ht.contains_key(name) {
            return Ok(Registered::Existing);
        }
        let exported = build()?;
        ht.insert(name.clone(), Arc::new(exported));
        Ok(Registered::New)
    }

    pub fn lookup(&self, name: &MetricName) -> Option<Arc<ExportedMetric>> {
        let ht = self.inner.lock().unwrap();
        ht.get(name).cloned()
    }

    pub fn contains(&self, name: &MetricName) -> bool {
        self.inner.lock().unwrap().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<MetricName> {
        let ht = self.inner.lock().unwrap();
        let mut names: Vec<MetricName> = ht.keys().cloned().collect();
        names.sort();
        names
    }
}
