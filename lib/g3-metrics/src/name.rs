/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

/// Identity of one live metric, a `(group, name)` tuple.
#[derive(Clone, Debug, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct MetricName {
    group: String,
    name: String,
}

impl MetricName {
    pub fn new<T: Into<String>>(name: T) -> Self {
        MetricName {
            group: String::new(),
            name: name.into(),
        }
    }

    pub fn with_group<G: Into<String>, T: Into<String>>(group: G, name: T) -> Self {
        MetricName {
            group: group.into(),
            name: name.into(),
        }
    }

    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.group, self.name)
        }
    }
}

impl From<&str> for MetricName {
    fn from(name: &str) -> Self {
        MetricName::new(name)
    }
}

impl From<String> for MetricName {
    fn from(name: String) -> Self {
        MetricName::new(name)
    }
}
