use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;

/// Layout used for transaction timestamps, both on screen and on disk.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kinds of monetary events recorded in an account history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
    UndoDeposit,
    UndoWithdraw,
    UndoTransfer,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 6] = [
        TransactionKind::Deposit,
        TransactionKind::Withdraw,
        TransactionKind::Transfer,
        TransactionKind::UndoDeposit,
        TransactionKind::UndoWithdraw,
        TransactionKind::UndoTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::Transfer => "TRANSFER",
            TransactionKind::UndoDeposit => "UNDO_DEPOSIT",
            TransactionKind::UndoWithdraw => "UNDO_WITHDRAW",
            TransactionKind::UndoTransfer => "UNDO_TRANSFER",
        }
    }

    /// Transfer-family kinds carry a counterpart account.
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            TransactionKind::Transfer | TransactionKind::UndoTransfer
        )
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TransactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| format!("unknown transaction kind `{value}`"))
    }
}

/// Immutable record of one balance movement on a single account.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: u32,
    pub kind: TransactionKind,
    pub amount: f64,
    pub counterpart: Option<u32>,
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    pub fn new(
        id: u32,
        kind: TransactionKind,
        amount: f64,
        counterpart: Option<u32>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            counterpart,
            timestamp,
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Single-line rendering used by transaction listings.
    pub fn display_line(&self) -> String {
        let base = format!(
            "[{}] {} {:.2}",
            self.formatted_timestamp(),
            self.kind,
            self.amount
        );
        match self.counterpart {
            Some(other) if self.kind.is_transfer() => format!("{base}  to/from acc {other}"),
            _ => base,
        }
    }
}
