use std::{
    fmt,
    io::{BufRead, Write},
    path::PathBuf,
    str::FromStr,
};

use crate::{
    core::services::{AccountService, TransactionService, UndoService},
    errors::LedgerError,
    ledger::Ledger,
    storage::{FlatFileStorage, StorageBackend},
    undo::{UndoEntry, UndoOp},
};

use super::{
    output::{styled, MessageKind},
    CliError,
};

const MENU: [&str; 10] = [
    "1) Create account",
    "2) List accounts",
    "3) Deposit",
    "4) Withdraw",
    "5) Transfer",
    "6) View transactions",
    "7) Undo last operation",
    "8) Save data",
    "9) Load data",
    "0) Exit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Menu-driven session that forwards every choice to the ledger services.
pub struct Shell<R, W> {
    ledger: Ledger,
    storage: FlatFileStorage,
    data_file: PathBuf,
    autosave_on_exit: bool,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(
        ledger: Ledger,
        data_file: PathBuf,
        autosave_on_exit: bool,
        input: R,
        output: W,
    ) -> Self {
        Self {
            ledger,
            storage: FlatFileStorage::new(),
            data_file,
            autosave_on_exit,
            input,
            output,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs the menu loop until the operator exits or input ends.
    pub fn run(&mut self) -> Result<(), CliError> {
        let greeting = format!(
            "Welcome to Finance Buddy (Data file: {})",
            self.data_file.display()
        );
        self.say(MessageKind::Info, greeting)?;
        loop {
            self.print_menu()?;
            let control = match self.read_line()? {
                Some(line) => match self.dispatch(line.trim()) {
                    Err(CliError::InputClosed) => LoopControl::Exit,
                    other => other?,
                },
                None => LoopControl::Exit,
            };
            if control == LoopControl::Exit {
                return self.shutdown();
            }
        }
    }

    pub fn dispatch(&mut self, choice: &str) -> Result<LoopControl, CliError> {
        match choice {
            "" => {}
            "0" => return Ok(LoopControl::Exit),
            "1" => self.create_account()?,
            "2" => self.list_accounts()?,
            "3" => self.deposit()?,
            "4" => self.withdraw()?,
            "5" => self.transfer()?,
            "6" => self.show_transactions()?,
            "7" => self.undo()?,
            "8" => self.save_data()?,
            "9" => self.load_data()?,
            _ => self.say(MessageKind::Error, "Invalid choice.")?,
        }
        Ok(LoopControl::Continue)
    }

    /// Replaces the in-memory ledger with the configured snapshot.
    pub fn load_data(&mut self) -> Result<(), CliError> {
        match self.storage.load(&mut self.ledger, &self.data_file) {
            Ok(report) if !report.found => self.say(
                MessageKind::Info,
                format!("No data file at {}, starting empty.", report.path.display()),
            ),
            Ok(report) => {
                for warning in &report.warnings {
                    self.say(MessageKind::Warning, format!("Skipped {warning}"))?;
                }
                self.say(
                    MessageKind::Success,
                    format!(
                        "Data loaded from {} ({} accounts, {} transactions).",
                        report.path.display(),
                        report.accounts,
                        report.transactions
                    ),
                )
            }
            Err(err) => self.report(&err),
        }
    }

    pub fn save_data(&mut self) -> Result<(), CliError> {
        match self.storage.save(&self.ledger, &self.data_file) {
            Ok(()) => {
                let message = format!("Data saved to {}", self.data_file.display());
                self.say(MessageKind::Success, message)
            }
            Err(err) => self.report(&err),
        }
    }

    fn shutdown(&mut self) -> Result<(), CliError> {
        if self.autosave_on_exit {
            self.save_data()?;
        }
        self.say(MessageKind::Info, "Goodbye.")
    }

    fn create_account(&mut self) -> Result<(), CliError> {
        let name = self.prompt("Enter account holder name")?;
        let Some(opening) = self.prompt_number::<f64>("Enter opening balance")? else {
            return Ok(());
        };
        let created = AccountService::create(&mut self.ledger, &name, opening)
            .map(|account| format!("Created account {} with ID {}", account.name, account.id));
        self.outcome(created)
    }

    fn list_accounts(&mut self) -> Result<(), CliError> {
        let lines: Vec<String> = AccountService::list(&self.ledger)
            .iter()
            .map(|a| format!("  ID:{}  Name:{}  Balance:{:.2}", a.id, a.name, a.balance))
            .collect();
        self.say(MessageKind::Section, "Accounts")?;
        if lines.is_empty() {
            return self.say(MessageKind::Info, "  (no accounts yet)");
        }
        for line in lines {
            self.say(MessageKind::Info, line)?;
        }
        Ok(())
    }

    fn deposit(&mut self) -> Result<(), CliError> {
        let Some(id) = self.prompt_number::<u32>("Account ID")? else {
            return Ok(());
        };
        let Some(amount) = self.prompt_number::<f64>("Amount to deposit")? else {
            return Ok(());
        };
        let result = TransactionService::deposit(&mut self.ledger, id, amount)
            .map(|_| format!("Deposited {amount:.2} to account {id}"));
        self.outcome(result)
    }

    fn withdraw(&mut self) -> Result<(), CliError> {
        let Some(id) = self.prompt_number::<u32>("Account ID")? else {
            return Ok(());
        };
        let Some(amount) = self.prompt_number::<f64>("Amount to withdraw")? else {
            return Ok(());
        };
        let result = TransactionService::withdraw(&mut self.ledger, id, amount)
            .map(|_| format!("Withdrawn {amount:.2} from account {id}"));
        self.outcome(result)
    }

    fn transfer(&mut self) -> Result<(), CliError> {
        let Some(from) = self.prompt_number::<u32>("From account ID")? else {
            return Ok(());
        };
        let Some(to) = self.prompt_number::<u32>("To account ID")? else {
            return Ok(());
        };
        let Some(amount) = self.prompt_number::<f64>("Amount to transfer")? else {
            return Ok(());
        };
        let result = TransactionService::transfer(&mut self.ledger, from, to, amount)
            .map(|_| format!("Transferred {amount:.2} from {from} to {to}"));
        self.outcome(result)
    }

    fn show_transactions(&mut self) -> Result<(), CliError> {
        let Some(id) = self.prompt_number::<u32>("Account ID")? else {
            return Ok(());
        };
        let rendered = AccountService::lookup(&self.ledger, id).map(|account| {
            let header = format!(
                "Transactions for {} (ID {}) [newest first]",
                account.name, account.id
            );
            let lines: Vec<String> = account
                .transactions()
                .map(|txn| format!("  {}", txn.display_line()))
                .collect();
            (header, lines)
        });
        let (header, lines) = match rendered {
            Ok(rendered) => rendered,
            Err(err) => return self.report(&err),
        };
        self.say(MessageKind::Section, header)?;
        if lines.is_empty() {
            return self.say(MessageKind::Info, "  (no transactions)");
        }
        for line in lines {
            self.say(MessageKind::Info, line)?;
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<(), CliError> {
        let result = UndoService::undo_last(&mut self.ledger).map(|entry| describe_undo(&entry));
        self.outcome(result)
    }

    fn outcome(&mut self, result: Result<String, LedgerError>) -> Result<(), CliError> {
        match result {
            Ok(message) => self.say(MessageKind::Success, message),
            Err(err) => self.report(&err),
        }
    }

    fn report(&mut self, err: &LedgerError) -> Result<(), CliError> {
        self.say(MessageKind::Error, err)
    }

    fn print_menu(&mut self) -> Result<(), CliError> {
        writeln!(self.output)?;
        self.say(MessageKind::Section, "Finance Buddy")?;
        for entry in MENU {
            writeln!(self.output, "{entry}")?;
        }
        self.ask("Choose")
    }

    fn say(&mut self, kind: MessageKind, message: impl fmt::Display) -> Result<(), CliError> {
        writeln!(self.output, "{}", styled(kind, message))?;
        Ok(())
    }

    fn ask(&mut self, label: &str) -> Result<(), CliError> {
        write!(self.output, "{}: ", styled(MessageKind::Prompt, label))?;
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, CliError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt(&mut self, label: &str) -> Result<String, CliError> {
        self.ask(label)?;
        self.read_line()?.ok_or(CliError::InputClosed)
    }

    /// Reads a number; unparsable input is reported and yields `None`.
    fn prompt_number<T: FromStr>(&mut self, label: &str) -> Result<Option<T>, CliError> {
        let raw = self.prompt(label)?;
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                self.say(MessageKind::Error, format!("`{}` is not a valid number.", raw.trim()))?;
                Ok(None)
            }
        }
    }
}

fn describe_undo(entry: &UndoEntry) -> String {
    match entry.op {
        UndoOp::Create => format!("Undid creation of account {}", entry.account_id),
        UndoOp::Deposit => format!(
            "Undid deposit of {:.2} from account {}",
            entry.amount, entry.account_id
        ),
        UndoOp::Withdraw => format!(
            "Undid withdraw of {:.2} to account {}",
            entry.amount, entry.account_id
        ),
        UndoOp::Transfer => format!(
            "Undid transfer of {:.2} from {} to {}",
            entry.amount,
            entry.account_id,
            entry.counterpart_id.unwrap_or_default()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, io::Cursor};
    use tempfile::tempdir;

    fn run_script(script: &str, data_file: PathBuf, autosave: bool) -> (Ledger, String) {
        let mut shell = Shell::new(
            Ledger::new(),
            data_file,
            autosave,
            Cursor::new(script.to_string()),
            Vec::new(),
        );
        shell.run().expect("session runs");
        let Shell { ledger, output, .. } = shell;
        (ledger, String::from_utf8(output).expect("utf8 output"))
    }

    #[test]
    fn scripted_session_moves_money() {
        let dir = tempdir().unwrap();
        let script = "1\nAlice\n100\n1\nBob\n5\n5\n1\n2\n30\n6\n2\n0\n";
        let (ledger, out) = run_script(script, dir.path().join("data.txt"), false);

        assert!(out.contains("Created account Alice with ID 1"));
        assert!(out.contains("Transferred 30.00 from 1 to 2"));
        assert!(out.contains("Transactions for Bob (ID 2) [newest first]"));
        assert!(out.contains("TRANSFER 30.00  to/from acc 1"));
        assert_eq!(ledger.account(1).unwrap().balance, 70.0);
        assert_eq!(ledger.account(2).unwrap().balance, 35.0);
    }

    #[test]
    fn invalid_input_is_reported_and_loop_continues() {
        let dir = tempdir().unwrap();
        let script = "42\n3\nabc\n4\n9\n5\n7\n7\n";
        let (ledger, out) = run_script(script, dir.path().join("data.txt"), false);

        assert!(out.contains("Invalid choice."));
        assert!(out.contains("`abc` is not a valid number."));
        assert!(out.contains("Account not found: 9"));
        assert!(out.contains("Nothing to undo"));
        assert!(ledger.is_empty());
    }

    #[test]
    fn exit_autosaves_and_eof_counts_as_exit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.txt");
        let (_, out) = run_script("1\nAlice\n12.5\n", path.clone(), true);

        assert!(out.contains("Data saved to"));
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("ACC|1|Alice|12.50\n"));
    }

    #[test]
    fn load_choice_replaces_session_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(
            &path,
            "ACC|4|Carol|8.00\nTX|4|11|DEPOSIT|8.00|0|2024-01-01 10:00:00\nbroken|line\nTX|4|x\n",
        )
        .unwrap();
        let (ledger, out) = run_script("1\nTemp\n1\n9\n2\n0\n", path, false);

        assert!(out.contains("Data loaded from"));
        assert!(out.contains("(1 accounts, 1 transactions)"));
        assert!(out.contains("Skipped Malformed record on line 4"));
        assert!(out.contains("ID:4  Name:Carol  Balance:8.00"));
        assert!(ledger.account(1).is_none());
        assert_eq!(ledger.next_transaction_id(), 12);
    }

    #[test]
    fn undo_messages_describe_the_reversal() {
        let dir = tempdir().unwrap();
        let script = "1\nAlice\n100\n3\n1\n50\n7\n7\n2\n0\n";
        let (ledger, out) = run_script(script, dir.path().join("data.txt"), false);

        assert!(out.contains("Undid deposit of 50.00 from account 1"));
        assert!(out.contains("Undid creation of account 1"));
        assert!(out.contains("(no accounts yet)"));
        assert!(ledger.is_empty());
    }
}
