/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

/// Value observed from a gauge at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub enum GaugeValue {
    Signed(i64),
    Unsigned(u64),
    Double(f64),
    Text(String),
    Absent,
}

impl GaugeValue {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            GaugeValue::Signed(_) | GaugeValue::Unsigned(_) | GaugeValue::Double(_)
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, GaugeValue::Signed(_) | GaugeValue::Unsigned(_))
    }
}

impl From<i64> for GaugeValue {
    fn from(v: i64) -> Self {
        GaugeValue::Signed(v)
    }
}

impl From<i32> for GaugeValue {
    fn from(v: i32) -> Self {
        GaugeValue::Signed(v as i64)
    }
}

impl From<u64> for GaugeValue {
    fn from(v: u64) -> Self {
        GaugeValue::Unsigned(v)
    }
}

impl From<usize> for GaugeValue {
    fn from(v: usize) -> Self {
        GaugeValue::Unsigned(v as u64)
    }
}

impl From<f64> for GaugeValue {
    fn from(v: f64) -> Self {
        GaugeValue::Double(v)
    }
}

impl From<String> for GaugeValue {
    fn from(v: String) -> Self {
        GaugeValue::Text(v)
    }
}

impl From<&str> for GaugeValue {
    fn from(v: &str) -> Self {
        GaugeValue::Text(v.to_string())
    }
}

impl<T: Into<GaugeValue>> From<Option<T>> for GaugeValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(GaugeValue::Absent)
    }
}

type GaugeFn = Box<dyn Fn() -> GaugeValue + Send + Sync>;

/// A metric whose value is computed on demand.
pub struct Gauge {
    value: GaugeFn,
}

impl Gauge {
    pub fn new<F, T>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<GaugeValue>,
    {
        Gauge {
            value: Box::new(move || f().into()),
        }
    }

    pub fn value(&self) -> GaugeValue {
        (self.value)()
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge")
            .field("value", &self.value())
            .finish()
    }
}
