//! Line-oriented `|`-delimited snapshot format.
//!
//! ```text
//! ACC|<id>|<name>|<balance>
//! TX|<account_id>|<tx_id>|<kind>|<amount>|<counterpart_id or 0>|<YYYY-MM-DD HH:MM:SS>
//! ```

use std::{
    collections::{HashMap, HashSet},
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::NaiveDateTime;

use crate::{
    errors::{LedgerError, RecordError},
    ledger::{Account, Ledger, Transaction, TransactionKind, MAX_ID, TIMESTAMP_FORMAT},
};

use super::{LoadReport, Result, StorageBackend};

const ACCOUNT_TAG: &str = "ACC";
const TRANSACTION_TAG: &str = "TX";
const SEPARATOR: char = '|';
const ACCOUNT_FIELDS: usize = 3;
const TRANSACTION_FIELDS: usize = 6;
const NO_COUNTERPART: u32 = 0;
const TMP_SUFFIX: &str = "tmp";

/// One decoded line of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Account(Account),
    Transaction {
        account_id: u32,
        transaction: Transaction,
    },
}

/// Accounts rebuilt from a snapshot together with the lines that were skipped.
#[derive(Debug, Default)]
pub struct DecodedLedger {
    pub accounts: Vec<Account>,
    pub warnings: Vec<RecordError>,
}

impl DecodedLedger {
    pub fn transaction_count(&self) -> usize {
        self.accounts.iter().map(Account::transaction_count).sum()
    }
}

/// Renders accounts in display order, each followed by its history newest-first.
pub fn encode_ledger(ledger: &Ledger) -> String {
    let mut out = String::new();
    for account in ledger.accounts() {
        out.push_str(&encode_account(account));
        out.push('\n');
        for txn in account.transactions() {
            out.push_str(&encode_transaction(account.id, txn));
            out.push('\n');
        }
    }
    out
}

fn encode_account(account: &Account) -> String {
    format!(
        "{ACCOUNT_TAG}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{:.2}",
        account.id, account.name, account.balance
    )
}

fn encode_transaction(account_id: u32, txn: &Transaction) -> String {
    format!(
        "{TRANSACTION_TAG}{SEPARATOR}{account_id}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{:.2}{SEPARATOR}{}{SEPARATOR}{}",
        txn.id,
        txn.kind,
        txn.amount,
        txn.counterpart.unwrap_or(NO_COUNTERPART),
        txn.formatted_timestamp()
    )
}

/// Parses a single snapshot line.
///
/// Blank lines and unknown tags yield `Ok(None)`; recognised tags with a bad shape are errors.
pub fn parse_line(line_no: usize, line: &str) -> std::result::Result<Option<Record>, RecordError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    let mut fields = line.split(SEPARATOR);
    let tag = fields.next().unwrap_or_default();
    let fields: Vec<&str> = fields.collect();
    let fail = |reason: String| RecordError::new(line_no, reason);

    match tag {
        ACCOUNT_TAG => {
            expect_fields(&fields, ACCOUNT_FIELDS, tag).map_err(fail)?;
            let id = parse_id(fields[0], "account id").map_err(fail)?;
            let balance = parse_amount(fields[2], "balance", true).map_err(fail)?;
            Ok(Some(Record::Account(Account::new(id, fields[1], balance))))
        }
        TRANSACTION_TAG => {
            expect_fields(&fields, TRANSACTION_FIELDS, tag).map_err(fail)?;
            let account_id = parse_id(fields[0], "account id").map_err(fail)?;
            let id = parse_id(fields[1], "transaction id").map_err(fail)?;
            let kind = TransactionKind::from_str(fields[2]).map_err(fail)?;
            // Opening deposits carry the opening balance, which may be negative.
            let signed = kind == TransactionKind::Deposit;
            let amount = parse_amount(fields[3], "amount", signed).map_err(fail)?;
            let counterpart = parse_number::<u32>(fields[4], "counterpart id").map_err(fail)?;
            let timestamp = NaiveDateTime::parse_from_str(fields[5].trim(), TIMESTAMP_FORMAT)
                .map_err(|err| fail(format!("invalid timestamp `{}`: {err}", fields[5])))?;
            let counterpart = (counterpart != NO_COUNTERPART).then_some(counterpart);
            Ok(Some(Record::Transaction {
                account_id,
                transaction: Transaction::new(id, kind, amount, counterpart, timestamp),
            }))
        }
        _ => Ok(None),
    }
}

fn expect_fields(fields: &[&str], expected: usize, tag: &str) -> std::result::Result<(), String> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(format!(
            "{tag} record needs {expected} fields, found {}",
            fields.len()
        ))
    }
}

fn parse_number<T: FromStr>(raw: &str, label: &str) -> std::result::Result<T, String> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| format!("invalid {label} `{raw}`"))
}

fn parse_id(raw: &str, label: &str) -> std::result::Result<u32, String> {
    match parse_number::<u32>(raw, label)? {
        0 => Err(format!("{label} must be positive")),
        id if id > MAX_ID => Err(format!("{label} {id} is out of range")),
        id => Ok(id),
    }
}

fn parse_amount(raw: &str, label: &str, signed: bool) -> std::result::Result<f64, String> {
    let value = parse_number::<f64>(raw, label)?;
    if !value.is_finite() || (!signed && value < 0.0) {
        return Err(format!("invalid {label} `{raw}`"));
    }
    Ok(value)
}

/// Rebuilds accounts from snapshot text, skipping every line that fails to decode.
///
/// Transactions may appear before or after their account; they are attached once all
/// lines are read. A later `ACC` line with an already seen id replaces the earlier one.
pub fn decode_ledger(contents: &str) -> DecodedLedger {
    let mut decoded = DecodedLedger::default();
    let mut index: HashMap<u32, usize> = HashMap::new();
    let mut pending: HashMap<u32, Vec<(usize, Transaction)>> = HashMap::new();
    let mut seen_transactions: HashSet<u32> = HashSet::new();

    for (offset, line) in contents.lines().enumerate() {
        let line_no = offset + 1;
        match parse_line(line_no, line) {
            Ok(Some(Record::Account(account))) => match index.get(&account.id) {
                Some(&slot) => {
                    decoded.warnings.push(RecordError::new(
                        line_no,
                        format!("duplicate account {} replaces earlier record", account.id),
                    ));
                    decoded.accounts[slot] = account;
                }
                None => {
                    index.insert(account.id, decoded.accounts.len());
                    decoded.accounts.push(account);
                }
            },
            Ok(Some(Record::Transaction {
                account_id,
                transaction,
            })) => {
                if !seen_transactions.insert(transaction.id) {
                    decoded.warnings.push(RecordError::new(
                        line_no,
                        format!("duplicate transaction id {}", transaction.id),
                    ));
                    continue;
                }
                pending
                    .entry(account_id)
                    .or_default()
                    .push((line_no, transaction));
            }
            Ok(None) => {}
            Err(err) => decoded.warnings.push(err),
        }
    }

    for account in decoded.accounts.iter_mut() {
        if let Some(history) = pending.remove(&account.id) {
            account.restore_history(history.into_iter().map(|(_, txn)| txn).collect());
        }
    }

    let mut orphans: Vec<(usize, u32)> = pending
        .into_iter()
        .flat_map(|(account_id, rows)| rows.into_iter().map(move |(line, _)| (line, account_id)))
        .collect();
    orphans.sort_unstable();
    decoded.warnings.extend(orphans.into_iter().map(|(line, account_id)| {
        RecordError::new(line, format!("transaction references unknown account {account_id}"))
    }));
    decoded.warnings.sort_by_key(|warning| warning.line);
    decoded
}

/// Filesystem persistence using the flat snapshot format.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatFileStorage;

impl FlatFileStorage {
    pub fn new() -> Self {
        Self
    }
}

impl StorageBackend for FlatFileStorage {
    fn save(&self, ledger: &Ledger, path: &Path) -> Result<()> {
        ensure_encodable(ledger)?;
        let tmp = tmp_path(path);
        let written = write_atomic(&tmp, &encode_ledger(ledger))
            .and_then(|()| fs::rename(&tmp, path).map_err(LedgerError::from));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %tmp.display(), "could not remove temporary file: {cleanup}");
                }
            }
            return Err(err);
        }
        tracing::info!(
            path = %path.display(),
            accounts = ledger.accounts().len(),
            transactions = ledger.transaction_count(),
            "ledger saved"
        );
        Ok(())
    }

    fn load(&self, ledger: &mut Ledger, path: &Path) -> Result<LoadReport> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no snapshot found, starting empty");
                ledger.clear();
                return Ok(LoadReport::missing(path));
            }
            Err(err) => return Err(LedgerError::Io(err)),
        };

        let decoded = decode_ledger(&String::from_utf8_lossy(&bytes));
        for warning in &decoded.warnings {
            tracing::warn!(path = %path.display(), "skipping line: {warning}");
        }
        let report = LoadReport {
            path: path.to_path_buf(),
            found: true,
            accounts: decoded.accounts.len(),
            transactions: decoded.transaction_count(),
            warnings: decoded.warnings.iter().map(ToString::to_string).collect(),
        };
        ledger.restore(decoded.accounts);
        tracing::info!(
            path = %path.display(),
            accounts = report.accounts,
            transactions = report.transactions,
            "ledger loaded"
        );
        Ok(report)
    }
}

/// Every balance and amount must survive `{:.2}` formatting and parse back.
fn ensure_encodable(ledger: &Ledger) -> Result<()> {
    for account in ledger.accounts() {
        if !account.balance.is_finite() {
            return Err(LedgerError::InvalidAmount(account.balance));
        }
        if let Some(txn) = account.transactions().find(|txn| !txn.amount.is_finite()) {
            return Err(LedgerError::InvalidAmount(txn.amount));
        }
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::{AccountService, TransactionService};
    use crate::core::time::FixedClock;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn fixed_ledger() -> Ledger {
        let instant = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 1)
            .unwrap();
        Ledger::with_clock(Arc::new(FixedClock(instant)))
    }

    #[test]
    fn encode_writes_accounts_then_history() {
        let mut ledger = fixed_ledger();
        let a = AccountService::create(&mut ledger, "Alice", 100.0).unwrap().id;
        let b = AccountService::create(&mut ledger, "Bob", 0.5).unwrap().id;
        TransactionService::transfer(&mut ledger, a, b, 12.25).unwrap();

        let expected = "\
ACC|2|Bob|12.75
TX|2|4|TRANSFER|12.25|1|2024-02-29 23:59:01
TX|2|2|DEPOSIT|0.50|0|2024-02-29 23:59:01
ACC|1|Alice|87.75
TX|1|3|TRANSFER|12.25|2|2024-02-29 23:59:01
TX|1|1|DEPOSIT|100.00|0|2024-02-29 23:59:01
";
        assert_eq!(encode_ledger(&ledger), expected);
    }

    #[test]
    fn parse_line_accepts_both_record_shapes() {
        let account = parse_line(1, "ACC|3|Rainy Day|-4.10\r\n").unwrap();
        assert_eq!(account, Some(Record::Account(Account::new(3, "Rainy Day", -4.1))));

        let Some(Record::Transaction {
            account_id,
            transaction,
        }) = parse_line(2, "TX|3|17|UNDO_TRANSFER|2.00|5|2023-12-31 08:00:00").unwrap()
        else {
            panic!("expected a transaction record");
        };
        assert_eq!(account_id, 3);
        assert_eq!(transaction.id, 17);
        assert_eq!(transaction.kind, TransactionKind::UndoTransfer);
        assert_eq!(transaction.counterpart, Some(5));
        assert_eq!(transaction.formatted_timestamp(), "2023-12-31 08:00:00");
    }

    #[test]
    fn parse_line_keeps_negative_opening_deposit() {
        let Ok(Some(Record::Transaction { transaction, .. })) =
            parse_line(1, "TX|4|9|DEPOSIT|-25.00|0|2024-01-01 00:00:00")
        else {
            panic!("expected a transaction record");
        };
        assert_eq!(transaction.kind, TransactionKind::Deposit);
        assert_eq!(transaction.amount, -25.0);
    }

    #[test]
    fn parse_line_accepts_highest_id() {
        let line = format!("ACC|{MAX_ID}|Last|1.00");
        let Ok(Some(Record::Account(account))) = parse_line(1, &line) else {
            panic!("expected an account record");
        };
        assert_eq!(account.id, MAX_ID);
    }

    #[test]
    fn save_refuses_non_finite_balances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.txt");
        let mut ledger = fixed_ledger();
        let id = AccountService::create(&mut ledger, "Alice", 1.0).unwrap().id;
        ledger.account_mut(id).unwrap().balance = f64::INFINITY;

        let err = FlatFileStorage::new()
            .save(&ledger, &path)
            .expect_err("infinite balance cannot be written");
        assert!(matches!(err, LedgerError::InvalidAmount(value) if value.is_infinite()));
        assert!(!path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn failed_rename_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the final rename fail.
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let mut ledger = fixed_ledger();
        AccountService::create(&mut ledger, "Alice", 1.0).unwrap();
        let err = FlatFileStorage::new()
            .save(&ledger, &path)
            .expect_err("rename onto a non-empty directory fails");
        assert!(matches!(err, LedgerError::Io(_)));
        assert!(!tmp_path(&path).exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn parse_line_maps_zero_counterpart_to_none() {
        let Ok(Some(Record::Transaction { transaction, .. })) =
            parse_line(1, "TX|1|1|DEPOSIT|1.00|0|2024-01-01 00:00:00")
        else {
            panic!("expected a transaction record");
        };
        assert_eq!(transaction.counterpart, None);
    }

    #[test]
    fn parse_line_ignores_blank_and_unknown_lines() {
        assert_eq!(parse_line(1, "   "), Ok(None));
        assert_eq!(parse_line(2, "# comment"), Ok(None));
        assert_eq!(parse_line(3, "ACCOUNT|1|x|1"), Ok(None));
    }

    #[test]
    fn parse_line_rejects_bad_shapes() {
        let bad = [
            "ACC|1|Alice",
            "ACC|1|Ali|ce|3.00",
            "ACC|x|Alice|3.00",
            "ACC|0|Alice|3.00",
            "ACC|1|Alice|NaN",
            "TX|1|2|DEPOSIT|1.00|0",
            "TX|1|2|REFUND|1.00|0|2024-01-01 00:00:00",
            "TX|1|2|WITHDRAW|-1.00|0|2024-01-01 00:00:00",
            "TX|1|2|DEPOSIT|inf|0|2024-01-01 00:00:00",
            "ACC|4294967295|Max|1.00",
            "TX|1|4294967295|DEPOSIT|1.00|0|2024-01-01 00:00:00",
            "TX|1|2|DEPOSIT|1.00|-3|2024-01-01 00:00:00",
            "TX|1|2|DEPOSIT|1.00|0|yesterday",
        ];
        for (idx, line) in bad.iter().enumerate() {
            let err = parse_line(idx + 1, line).expect_err(line);
            assert_eq!(err.line, idx + 1);
        }
    }

    #[test]
    fn decode_attaches_transactions_regardless_of_order() {
        let text = "\
TX|1|2|DEPOSIT|5.00|0|2024-01-02 00:00:00
garbage line
ACC|1|Alice|15.00
TX|1|1|DEPOSIT|10.00|0|2024-01-01 00:00:00
TX|9|3|DEPOSIT|1.00|0|2024-01-03 00:00:00
";
        let decoded = decode_ledger(text);
        assert_eq!(decoded.accounts.len(), 1);
        let ids: Vec<u32> = decoded.accounts[0].transactions().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(decoded.transaction_count(), 2);
        // "garbage line" has no known tag, so only the orphan is reported.
        assert_eq!(decoded.warnings.len(), 1);
        assert_eq!(decoded.warnings[0].line, 5);
    }

    #[test]
    fn decode_reports_duplicates() {
        let text = "\
ACC|1|Old|1.00
ACC|1|New|2.00
TX|1|1|DEPOSIT|1.00|0|2024-01-01 00:00:00
TX|1|1|DEPOSIT|1.00|0|2024-01-01 00:00:00
";
        let decoded = decode_ledger(text);
        assert_eq!(decoded.accounts.len(), 1);
        assert_eq!(decoded.accounts[0].name, "New");
        assert_eq!(decoded.transaction_count(), 1);
        let lines: Vec<usize> = decoded.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("data/finance_data.txt")),
            PathBuf::from("data/finance_data.txt.tmp")
        );
        assert_eq!(tmp_path(Path::new("ledger")), PathBuf::from("ledger.tmp"));
    }
}
