use std::{fmt, sync::Arc};

use crate::{
    core::time::{Clock, SystemClock},
    errors::LedgerError,
    undo::UndoJournal,
};

use super::{
    account::Account,
    transaction::{Transaction, TransactionKind},
};

const FIRST_ID: u32 = 1;

/// Highest id handed out for accounts and transactions. `u32::MAX` stays free so a
/// counter one past the last id always fits.
pub const MAX_ID: u32 = u32::MAX - 1;

/// In-memory store for accounts, their histories, the id counters and the undo journal.
///
/// The store only offers primitives; validation and undo bookkeeping for the public
/// operations live in [`crate::core::services`].
pub struct Ledger {
    /// Most recently created first.
    accounts: Vec<Account>,
    next_account_id: u32,
    next_transaction_id: u32,
    journal: UndoJournal,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Creates an empty ledger stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: Vec::new(),
            next_account_id: FIRST_ID,
            next_transaction_id: FIRST_ID,
            journal: UndoJournal::new(),
            clock,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, id: u32) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: u32) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn require_account(&self, id: u32) -> Result<&Account, LedgerError> {
        self.account(id).ok_or(LedgerError::AccountNotFound(id))
    }

    /// Adds a new account under the next free id and returns that id.
    pub fn insert_account(
        &mut self,
        name: impl Into<String>,
        opening_balance: f64,
    ) -> Result<u32, LedgerError> {
        let id = self.next_account_id;
        if id > MAX_ID {
            return Err(LedgerError::IdSpaceExhausted("account"));
        }
        self.next_account_id = id + 1;
        self.accounts.insert(0, Account::new(id, name, opening_balance));
        Ok(id)
    }

    /// Fails unless `count` more transaction ids can be handed out.
    pub fn ensure_transaction_ids(&self, count: u32) -> Result<(), LedgerError> {
        let last = self
            .next_transaction_id
            .checked_add(count.saturating_sub(1));
        match last {
            Some(last) if last <= MAX_ID => Ok(()),
            _ => Err(LedgerError::IdSpaceExhausted("transaction")),
        }
    }

    /// Drops an account together with its whole history.
    pub fn remove_account(&mut self, id: u32) -> Option<Account> {
        let index = self.accounts.iter().position(|account| account.id == id)?;
        Some(self.accounts.remove(index))
    }

    /// Stamps a new transaction and prepends it to the account history.
    pub fn append_transaction(
        &mut self,
        account_id: u32,
        kind: TransactionKind,
        amount: f64,
        counterpart: Option<u32>,
    ) -> Result<u32, LedgerError> {
        if self.account(account_id).is_none() {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        self.ensure_transaction_ids(1)?;
        let id = self.next_transaction_id;
        self.next_transaction_id = id + 1;
        let transaction = Transaction::new(id, kind, amount, counterpart, self.clock.now());
        if let Some(account) = self.account_mut(account_id) {
            account.record(transaction);
        }
        Ok(id)
    }

    pub fn journal(&self) -> &UndoJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut UndoJournal {
        &mut self.journal
    }

    pub fn next_account_id(&self) -> u32 {
        self.next_account_id
    }

    pub fn next_transaction_id(&self) -> u32 {
        self.next_transaction_id
    }

    pub fn undo_depth(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn transaction_count(&self) -> usize {
        self.accounts.iter().map(Account::transaction_count).sum()
    }

    pub fn total_balance(&self) -> f64 {
        self.accounts.iter().map(|account| account.balance).sum()
    }

    /// Discards every account, the undo journal and resets both id counters.
    pub fn clear(&mut self) {
        self.accounts.clear();
        self.journal.clear();
        self.next_account_id = FIRST_ID;
        self.next_transaction_id = FIRST_ID;
    }

    /// Replaces the whole state with restored accounts.
    ///
    /// Counters resume one past the highest account and transaction ids present. A
    /// counter that lands past [`MAX_ID`] makes further allocations fail instead of wrapping.
    pub(crate) fn restore(&mut self, accounts: Vec<Account>) {
        self.clear();
        let max_account = accounts.iter().map(|account| account.id).max();
        let max_transaction = accounts
            .iter()
            .flat_map(|account| account.transactions().map(|txn| txn.id))
            .max();
        self.next_account_id = max_account.map_or(FIRST_ID, |id| id.saturating_add(1));
        self.next_transaction_id = max_transaction.map_or(FIRST_ID, |id| id.saturating_add(1));
        self.accounts = accounts;
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("accounts", &self.accounts)
            .field("next_account_id", &self.next_account_id)
            .field("next_transaction_id", &self.next_transaction_id)
            .field("journal", &self.journal)
            .finish_non_exhaustive()
    }
}
