use thiserror::Error;

/// Error type that captures every recoverable ledger failure.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(u32),
    #[error("Insufficient funds in account {account}: balance {balance:.2}, requested {requested:.2}")]
    InsufficientFunds {
        account: u32,
        balance: f64,
        requested: f64,
    },
    #[error("Source and destination cannot be the same account ({0})")]
    SameAccount(u32),
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
    #[error("No {0} ids left to assign")]
    IdSpaceExhausted(&'static str),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Cannot undo automatically: {0}")]
    UndoNotReversible(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

/// A persisted line that could not be decoded into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed record on line {line}: {reason}")]
pub struct RecordError {
    pub line: usize,
    pub reason: String,
}

impl RecordError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}
