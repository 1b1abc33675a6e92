/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::SlotError;

mod units;
pub use units::{Units, Variability};

mod value;
pub use value::{SlotValue, SlotValueKind};

mod layout;
pub use layout::MAX_NAME_LEN;

mod area;

mod slot;
pub use slot::{FieldSlot, SlotSpec};

pub mod facility;
pub use facility::{PerfData, PerfDataEntry, SlotFacility, Unavailable};

mod config;
pub use config::PerfDataConfig;
