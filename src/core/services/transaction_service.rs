//! Balance-moving operations and account history queries.

use crate::errors::LedgerError;
use crate::ledger::{Ledger, Transaction, TransactionKind};
use crate::undo::UndoEntry;

use super::{ensure_amount, ensure_credit, ServiceResult};

/// Validated deposit, withdrawal and transfer helpers.
///
/// Each successful call changes balances, appends one transaction per touched account and
/// journals exactly one undo entry. Failed calls leave the ledger untouched.
pub struct TransactionService;

impl TransactionService {
    /// Credits `amount` to the account and returns the new transaction id.
    pub fn deposit(ledger: &mut Ledger, account_id: u32, amount: f64) -> ServiceResult<u32> {
        ensure_amount(amount)?;
        let balance = ledger.require_account(account_id)?.balance;
        ensure_credit(balance, amount)?;
        ledger.ensure_transaction_ids(1)?;
        let account = ledger
            .account_mut(account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        account.balance += amount;
        let txn = ledger.append_transaction(account_id, TransactionKind::Deposit, amount, None)?;
        ledger
            .journal_mut()
            .record(UndoEntry::deposit(account_id, amount));
        tracing::info!(account = account_id, amount, "deposit applied");
        Ok(txn)
    }

    /// Debits `amount`; a balance exactly equal to the amount is enough.
    pub fn withdraw(ledger: &mut Ledger, account_id: u32, amount: f64) -> ServiceResult<u32> {
        ensure_amount(amount)?;
        let balance = ledger.require_account(account_id)?.balance;
        if balance < amount {
            tracing::warn!(account = account_id, amount, "withdrawal rejected");
            return Err(LedgerError::InsufficientFunds {
                account: account_id,
                balance,
                requested: amount,
            });
        }
        ledger.ensure_transaction_ids(1)?;
        let account = ledger
            .account_mut(account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        account.balance -= amount;
        let txn = ledger.append_transaction(account_id, TransactionKind::Withdraw, amount, None)?;
        ledger
            .journal_mut()
            .record(UndoEntry::withdraw(account_id, amount));
        tracing::info!(account = account_id, amount, "withdrawal applied");
        Ok(txn)
    }

    /// Moves `amount` from one account to another, returning both transaction ids
    /// as `(source, destination)`.
    pub fn transfer(
        ledger: &mut Ledger,
        from_id: u32,
        to_id: u32,
        amount: f64,
    ) -> ServiceResult<(u32, u32)> {
        if from_id == to_id {
            return Err(LedgerError::SameAccount(from_id));
        }
        ensure_amount(amount)?;
        let source_balance = ledger.require_account(from_id)?.balance;
        let destination_balance = ledger.require_account(to_id)?.balance;
        if source_balance < amount {
            tracing::warn!(from = from_id, to = to_id, amount, "transfer rejected");
            return Err(LedgerError::InsufficientFunds {
                account: from_id,
                balance: source_balance,
                requested: amount,
            });
        }
        ensure_credit(destination_balance, amount)?;
        ledger.ensure_transaction_ids(2)?;

        if let Some(source) = ledger.account_mut(from_id) {
            source.balance -= amount;
        }
        if let Some(destination) = ledger.account_mut(to_id) {
            destination.balance += amount;
        }
        let out =
            ledger.append_transaction(from_id, TransactionKind::Transfer, amount, Some(to_id))?;
        let inbound =
            ledger.append_transaction(to_id, TransactionKind::Transfer, amount, Some(from_id))?;
        ledger
            .journal_mut()
            .record(UndoEntry::transfer(from_id, to_id, amount));
        tracing::info!(from = from_id, to = to_id, amount, "transfer applied");
        Ok((out, inbound))
    }

    /// Returns the account history newest-first.
    pub fn history(ledger: &Ledger, account_id: u32) -> ServiceResult<Vec<&Transaction>> {
        Ok(ledger.require_account(account_id)?.transactions().collect())
    }
}
