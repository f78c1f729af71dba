use std::collections::VecDeque;

use super::transaction::Transaction;

/// A named balance holder that owns its own transaction history.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: u32,
    pub name: String,
    pub balance: f64,
    /// Newest entry at the front.
    transactions: VecDeque<Transaction>,
}

impl Account {
    /// Creates an account with an empty history.
    pub fn new(id: u32, name: impl Into<String>, balance: f64) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
            transactions: VecDeque::new(),
        }
    }

    /// Iterates the history newest-first.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn latest_transaction(&self) -> Option<&Transaction> {
        self.transactions.front()
    }

    pub(crate) fn record(&mut self, transaction: Transaction) {
        self.transactions.push_front(transaction);
    }

    /// Replaces the history with restored records, ordering them newest-first by id.
    pub(crate) fn restore_history(&mut self, mut history: Vec<Transaction>) {
        history.sort_by(|a, b| b.id.cmp(&a.id));
        self.transactions = history.into();
    }
}
