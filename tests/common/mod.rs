#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use finance_buddy::{core::time::FixedClock, ledger::Ledger};

pub fn instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 15)
        .expect("valid date")
        .and_hms_opt(18, 45, 30)
        .expect("valid time")
}

/// Ledger whose transactions are all stamped with [`instant`].
pub fn fixed_ledger() -> Ledger {
    Ledger::with_clock(Arc::new(FixedClock(instant())))
}
