use crate::errors::LedgerError;
use crate::ledger::{Ledger, TransactionKind};
use crate::undo::{UndoEntry, UndoOp};

use super::ServiceResult;

/// Reverses the most recent journaled mutation.
pub struct UndoService;

impl UndoService {
    /// Pops the newest undo entry and applies its inverse.
    ///
    /// The entry is discarded even when the reversal is refused, so a failed undo can
    /// never be retried. Refusals leave balances and histories unchanged.
    pub fn undo_last(ledger: &mut Ledger) -> ServiceResult<UndoEntry> {
        let entry = ledger
            .journal_mut()
            .pop()
            .ok_or(LedgerError::NothingToUndo)?;

        let outcome = match entry.op {
            UndoOp::Deposit => Self::reverse_deposit(ledger, &entry),
            UndoOp::Withdraw => Self::reverse_withdraw(ledger, &entry),
            UndoOp::Transfer => Self::reverse_transfer(ledger, &entry),
            UndoOp::Create => Self::reverse_create(ledger, &entry),
        };

        match &outcome {
            Ok(()) => tracing::info!(
                op = %entry.op,
                account = entry.account_id,
                amount = entry.amount,
                "operation undone"
            ),
            Err(err) => tracing::warn!(op = %entry.op, account = entry.account_id, "{err}"),
        }
        outcome.map(|()| entry)
    }

    fn reverse_deposit(ledger: &mut Ledger, entry: &UndoEntry) -> ServiceResult<()> {
        let id = entry.account_id;
        let balance = ledger.account(id).ok_or_else(|| missing(id))?.balance;
        if balance < entry.amount {
            return Err(LedgerError::UndoNotReversible(format!(
                "insufficient balance in account {id} to take back deposit of {:.2}",
                entry.amount
            )));
        }
        ledger.ensure_transaction_ids(1)?;
        if let Some(account) = ledger.account_mut(id) {
            account.balance -= entry.amount;
        }
        ledger.append_transaction(id, TransactionKind::UndoDeposit, entry.amount, None)?;
        Ok(())
    }

    fn reverse_withdraw(ledger: &mut Ledger, entry: &UndoEntry) -> ServiceResult<()> {
        let id = entry.account_id;
        ledger.account(id).ok_or_else(|| missing(id))?;
        ledger.ensure_transaction_ids(1)?;
        if let Some(account) = ledger.account_mut(id) {
            account.balance += entry.amount;
        }
        ledger.append_transaction(id, TransactionKind::UndoWithdraw, entry.amount, None)?;
        Ok(())
    }

    fn reverse_transfer(ledger: &mut Ledger, entry: &UndoEntry) -> ServiceResult<()> {
        let from = entry.account_id;
        let to = entry
            .counterpart_id
            .ok_or_else(|| LedgerError::UndoNotReversible("transfer has no destination".into()))?;
        ledger.account(from).ok_or_else(|| missing(from))?;
        let destination_balance = ledger.account(to).ok_or_else(|| missing(to))?.balance;
        if destination_balance < entry.amount {
            return Err(LedgerError::UndoNotReversible(format!(
                "account {to} no longer holds the {:.2} transferred from account {from}",
                entry.amount
            )));
        }
        ledger.ensure_transaction_ids(2)?;

        if let Some(source) = ledger.account_mut(from) {
            source.balance += entry.amount;
        }
        if let Some(destination) = ledger.account_mut(to) {
            destination.balance -= entry.amount;
        }
        ledger.append_transaction(from, TransactionKind::UndoTransfer, entry.amount, Some(to))?;
        ledger.append_transaction(to, TransactionKind::UndoTransfer, entry.amount, Some(from))?;
        Ok(())
    }

    /// Removes the account outright, whatever happened to it after creation.
    fn reverse_create(ledger: &mut Ledger, entry: &UndoEntry) -> ServiceResult<()> {
        let removed = ledger
            .remove_account(entry.account_id)
            .ok_or_else(|| missing(entry.account_id))?;
        if removed.transaction_count() > 1 {
            tracing::warn!(
                account = removed.id,
                discarded = removed.transaction_count(),
                "account removed together with later activity"
            );
        }
        Ok(())
    }
}

fn missing(id: u32) -> LedgerError {
    LedgerError::UndoNotReversible(format!("account {id} no longer exists"))
}
