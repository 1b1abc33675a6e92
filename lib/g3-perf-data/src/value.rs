/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

/// Numeric representation of the 64 bits stored in a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotValueKind {
    Long,
    #[default]
    Double,
}

impl SlotValueKind {
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            SlotValueKind::Long => 1,
            SlotValueKind::Double => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SlotValueKind::Long),
            2 => Some(SlotValueKind::Double),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            SlotValueKind::Long => "long",
            SlotValueKind::Double => "double",
        }
    }
}

impl fmt::Display for SlotValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SlotValue {
    Long(i64),
    Double(f64),
}

impl SlotValue {
    #[inline]
    pub fn kind(&self) -> SlotValueKind {
        match self {
            SlotValue::Long(_) => SlotValueKind::Long,
            SlotValue::Double(_) => SlotValueKind::Double,
        }
    }

    /// Convert to the representation of `kind`.
    ///
    /// Doubles are truncated toward zero when stored as long, saturating
    /// at the i64 bounds, and NaN becomes 0.
    pub fn coerce(self, kind: SlotValueKind) -> SlotValue {
        match (self, kind) {
            (SlotValue::Double(f), SlotValueKind::Long) => SlotValue::Long(f as i64),
            (SlotValue::Long(i), SlotValueKind::Double) => SlotValue::Double(i as f64),
            (v, _) => v,
        }
    }

    pub fn to_bits(self, kind: SlotValueKind) -> u64 {
        match self.coerce(kind) {
            SlotValue::Long(i) => i as u64,
            SlotValue::Double(f) => f.to_bits(),
        }
    }

    pub fn from_bits(bits: u64, kind: SlotValueKind) -> SlotValue {
        match kind {
            SlotValueKind::Long => SlotValue::Long(bits as i64),
            SlotValueKind::Double => SlotValue::Double(f64::from_bits(bits)),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            SlotValue::Long(i) => *i,
            SlotValue::Double(f) => *f as i64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            SlotValue::Long(i) => *i as f64,
            SlotValue::Double(f) => *f,
        }
    }
}

impl Default for SlotValue {
    fn default() -> Self {
        SlotValue::Long(0)
    }
}

impl From<i64> for SlotValue {
    fn from(v: i64) -> Self {
        SlotValue::Long(v)
    }
}

impl From<u64> for SlotValue {
    fn from(v: u64) -> Self {
        SlotValue::Long(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for SlotValue {
    fn from(v: f64) -> Self {
        SlotValue::Double(v)
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Long(i) => write!(f, "{i}"),
            SlotValue::Double(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce() {
        let v = SlotValue::Double(2.5);
        assert_eq!(v.coerce(SlotValueKind::Long), SlotValue::Long(2));
        assert_eq!(v.coerce(SlotValueKind::Double), v);

        let v = SlotValue::Double(-2.9);
        assert_eq!(v.coerce(SlotValueKind::Long), SlotValue::Long(-2));

        let v = SlotValue::Double(f64::NAN);
        assert_eq!(v.coerce(SlotValueKind::Long), SlotValue::Long(0));

        let v = SlotValue::Double(1e30);
        assert_eq!(v.coerce(SlotValueKind::Long), SlotValue::Long(i64::MAX));

        let v = SlotValue::Long(7);
        assert_eq!(v.coerce(SlotValueKind::Double), SlotValue::Double(7.0));
    }

    #[test]
    fn bits() {
        let bits = SlotValue::Long(-1).to_bits(SlotValueKind::Long);
        assert_eq!(bits, u64::MAX);
        assert_eq!(
            SlotValue::from_bits(bits, SlotValueKind::Long),
            SlotValue::Long(-1)
        );

        let bits = SlotValue::Long(3).to_bits(SlotValueKind::Double);
        assert_eq!(bits, 3.0_f64.to_bits());

        let bits = SlotValue::Double(0.125).to_bits(SlotValueKind::Double);
        assert_eq!(
            SlotValue::from_bits(bits, SlotValueKind::Double),
            SlotValue::Double(0.125)
        );
    }

    #[test]
    fn from_unsigned() {
        assert_eq!(SlotValue::from(10u64), SlotValue::Long(10));
        assert_eq!(SlotValue::from(u64::MAX), SlotValue::Long(i64::MAX));
    }
}
