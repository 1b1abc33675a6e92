/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("perf data facility is unavailable: {0}")]
    Unavailable(String),
    #[error("invalid slot name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("slot name {0} has already been allocated")]
    DuplicateName(String),
    #[error("no space left for slot {name}: {requested} bytes requested, {available} available")]
    Exhausted {
        name: String,
        requested: usize,
        available: usize,
    },
    #[error("invalid perf data capacity {0}")]
    InvalidCapacity(usize),
    #[error("perf data io error: {0}")]
    Io(#[from] io::Error),
}
