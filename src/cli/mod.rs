//! Thin interactive front end over the ledger services.

pub mod output;
pub mod shell;

use std::io;

use thiserror::Error;

use crate::{config::ConfigManager, errors::LedgerError, ledger::Ledger, utils::build_info};

pub use shell::{LoopControl, Shell};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("input closed")]
    InputClosed,
}

/// Entry point used by the `finance_buddy_cli` binary.
pub fn run_cli() -> Result<(), CliError> {
    if std::env::args()
        .skip(1)
        .any(|arg| arg == "--version" || arg == "-V")
    {
        println!("{}", build_info::current().summary());
        return Ok(());
    }

    let manager = ConfigManager::new();
    let config = manager.load()?;
    if !config.ui_color_enabled {
        output::disable_color();
    }
    let data_file = manager.data_file(&config);
    tracing::debug!(path = %data_file.display(), "using data file");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(
        Ledger::new(),
        data_file,
        config.autosave_on_exit,
        stdin.lock(),
        stdout.lock(),
    );
    if config.load_on_start {
        shell.load_data()?;
    }
    shell.run()
}
