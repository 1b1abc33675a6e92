/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

/// How the value of a slot is expected to move.
///
/// The codes are the ones used by perf-data readers, and are written
/// into the entry header as is. Nothing here enforces the variability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Variability {
    Constant = 1,
    Monotonic = 2,
    Variable = 3,
}

impl Variability {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Variability::Constant),
            2 => Some(Variability::Monotonic),
            3 => Some(Variability::Variable),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Variability::Constant => "constant",
            Variability::Monotonic => "monotonic",
            Variability::Variable => "variable",
        }
    }
}

impl fmt::Display for Variability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Units {
    None = 1,
    Bytes = 2,
    Ticks = 3,
    Events = 4,
    String = 5,
    Hertz = 6,
}

impl Units {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Units::None),
            2 => Some(Units::Bytes),
            3 => Some(Units::Ticks),
            4 => Some(Units::Events),
            5 => Some(Units::String),
            6 => Some(Units::Hertz),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Units::None => "none",
            Units::Bytes => "bytes",
            Units::Ticks => "ticks",
            Units::Events => "events",
            Units::String => "string",
            Units::Hertz => "hertz",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
