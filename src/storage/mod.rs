pub mod flat_file;

use std::path::{Path, PathBuf};

use crate::{errors::LedgerError, ledger::Ledger};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Abstraction over persistence backends able to snapshot and restore a whole ledger.
pub trait StorageBackend {
    /// Writes every account and transaction. The undo journal is never persisted.
    fn save(&self, ledger: &Ledger, path: &Path) -> Result<()>;

    /// Replaces the ledger state with the snapshot at `path`.
    ///
    /// A missing file leaves an empty ledger and is not an error.
    fn load(&self, ledger: &mut Ledger, path: &Path) -> Result<LoadReport>;
}

/// Summary of a load, including the lines that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub path: PathBuf,
    pub found: bool,
    pub accounts: usize,
    pub transactions: usize,
    pub warnings: Vec<String>,
}

impl LoadReport {
    pub fn missing(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }
}

pub use flat_file::{decode_ledger, encode_ledger, parse_line, DecodedLedger, FlatFileStorage, Record};
