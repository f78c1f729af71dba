pub mod account_service;
pub mod transaction_service;
pub mod undo_service;

pub use account_service::AccountService;
pub use transaction_service::TransactionService;
pub use undo_service::UndoService;

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, LedgerError>;

/// Movement amounts must be finite and non-negative.
fn ensure_amount(amount: f64) -> ServiceResult<()> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

/// Rejects a credit that would push a balance past what `f64` can hold.
fn ensure_credit(balance: f64, amount: f64) -> ServiceResult<()> {
    if (balance + amount).is_finite() {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use crate::core::time::FixedClock;
    use crate::ledger::Ledger;

    pub fn fixed_ledger() -> Ledger {
        let instant = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        Ledger::with_clock(Arc::new(FixedClock(instant)))
    }
}
