//! Single-level undo journal for ledger mutations.

use std::fmt;

/// Mutation kinds that can be reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndoOp {
    Create,
    Deposit,
    Withdraw,
    Transfer,
}

impl fmt::Display for UndoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UndoOp::Create => "CREATE",
            UndoOp::Deposit => "DEPOSIT",
            UndoOp::Withdraw => "WITHDRAW",
            UndoOp::Transfer => "TRANSFER",
        };
        f.write_str(label)
    }
}

/// Enough information to apply the inverse of one completed mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UndoEntry {
    pub op: UndoOp,
    pub account_id: u32,
    /// Destination of a transfer.
    pub counterpart_id: Option<u32>,
    pub amount: f64,
}

impl UndoEntry {
    pub fn create(account_id: u32, opening_balance: f64) -> Self {
        Self::single(UndoOp::Create, account_id, opening_balance)
    }

    pub fn deposit(account_id: u32, amount: f64) -> Self {
        Self::single(UndoOp::Deposit, account_id, amount)
    }

    pub fn withdraw(account_id: u32, amount: f64) -> Self {
        Self::single(UndoOp::Withdraw, account_id, amount)
    }

    pub fn transfer(from: u32, to: u32, amount: f64) -> Self {
        Self {
            op: UndoOp::Transfer,
            account_id: from,
            counterpart_id: Some(to),
            amount,
        }
    }

    fn single(op: UndoOp, account_id: u32, amount: f64) -> Self {
        Self {
            op,
            account_id,
            counterpart_id: None,
            amount,
        }
    }
}

/// Last-in-first-out stack of [`UndoEntry`] values shared by the whole ledger.
#[derive(Debug, Clone, Default)]
pub struct UndoJournal {
    entries: Vec<UndoEntry>,
}

impl UndoJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: UndoEntry) {
        tracing::debug!(op = %entry.op, account = entry.account_id, "undo entry recorded");
        self.entries.push(entry);
    }

    /// Removes the newest entry. A popped entry is gone for good.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
