use crate::errors::LedgerError;
use crate::ledger::{Account, Ledger, TransactionKind};
use crate::undo::UndoEntry;

use super::ServiceResult;

pub struct AccountService;

impl AccountService {
    /// Opens an account, records the opening balance as a deposit and journals the creation.
    ///
    /// Any finite opening balance is accepted, negative ones included.
    pub fn create<'a>(
        ledger: &'a mut Ledger,
        name: &str,
        opening_balance: f64,
    ) -> ServiceResult<&'a Account> {
        if !opening_balance.is_finite() {
            tracing::warn!(opening_balance, "account creation rejected");
            return Err(LedgerError::InvalidAmount(opening_balance));
        }
        ledger.ensure_transaction_ids(1)?;
        let name = Self::sanitize_name(name);
        let id = ledger.insert_account(name, opening_balance)?;
        ledger.append_transaction(id, TransactionKind::Deposit, opening_balance, None)?;
        ledger
            .journal_mut()
            .record(UndoEntry::create(id, opening_balance));
        tracing::info!(account = id, opening_balance, "account created");
        ledger.require_account(id)
    }

    pub fn lookup(ledger: &Ledger, id: u32) -> ServiceResult<&Account> {
        ledger.require_account(id)
    }

    /// Accounts in display order, most recently created first.
    pub fn list(ledger: &Ledger) -> Vec<&Account> {
        ledger.accounts().iter().collect()
    }

    /// Names are stored on a single `|`-delimited line, so separators and line breaks are blanked.
    fn sanitize_name(candidate: &str) -> String {
        candidate
            .trim()
            .chars()
            .map(|ch| if ch == '|' || ch.is_control() { ' ' } else { ch })
            .collect()
    }
}
