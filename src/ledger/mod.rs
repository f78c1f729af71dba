//! Ledger domain models and the in-memory account store.

pub mod account;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod transaction;

pub use account::Account;
pub use ledger::{Ledger, MAX_ID};
pub use transaction::{Transaction, TransactionKind, TIMESTAMP_FORMAT};
