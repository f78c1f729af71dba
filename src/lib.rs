#![doc(test(attr(deny(warnings))))]

//! Finance Buddy is an in-memory personal-finance ledger: accounts with append-only
//! histories, deposits, withdrawals and transfers, a single-step undo journal and a
//! flat-file snapshot format.
//!
//! ```
//! use finance_buddy::core::services::{AccountService, TransactionService, UndoService};
//! use finance_buddy::ledger::Ledger;
//!
//! let mut ledger = Ledger::new();
//! let id = AccountService::create(&mut ledger, "Alice", 100.0).unwrap().id;
//! TransactionService::deposit(&mut ledger, id, 50.0).unwrap();
//! UndoService::undo_last(&mut ledger).unwrap();
//! assert_eq!(ledger.account(id).unwrap().balance, 100.0);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod undo;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("Finance Buddy tracing initialized.");
    });
}
