/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use g3_perf_data::{PerfDataConfig, SlotValueKind};

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_PREFIX: &str = "metric";
const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct PerfReporterConfig {
    prefix: String,
    pub emit_interval: Duration,
    /// Value kind of all floating point fields.
    pub value_kind: SlotValueKind,
    pub perf_data: PerfDataConfig,
}

impl Default for PerfReporterConfig {
    fn default() -> Self {
        PerfReporterConfig {
            prefix: DEFAULT_PREFIX.to_string(),
            emit_interval: DEFAULT_EMIT_INTERVAL,
            value_kind: SlotValueKind::default(),
            perf_data: PerfDataConfig::default(),
        }
    }
}

impl PerfReporterConfig {
    pub fn with_prefix<T: Into<String>>(prefix: T) -> Self {
        let mut config = PerfReporterConfig::default();
        config.set_prefix(prefix);
        config
    }

    /// Set the prefix of all slot names. Surrounding dots are stripped.
    pub fn set_prefix<T: Into<String>>(&mut self, prefix: T) {
        let prefix = prefix.into();
        self.prefix = prefix.trim_matches('.').to_string();
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Compose the slot name of one field of a metric.
    pub fn slot_name(&self, metric: &str, suffix: &str) -> String {
        if self.prefix.is_empty() {
            format!("{metric}.{suffix}")
        } else {
            format!("{}.{metric}.{suffix}", self.prefix)
        }
    }
}
