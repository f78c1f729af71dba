use dirs::home_dir;
use std::{env, path::PathBuf};

const HOME_ENV: &str = "FINANCE_BUDDY_HOME";
const DEFAULT_DIR_NAME: &str = ".finance_buddy";
const CONFIG_FILE: &str = "config.json";
const DATA_FILE: &str = "finance_data.txt";

/// Returns the application data directory, defaulting to `~/.finance_buddy`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Snapshot file used when the configuration does not name one.
pub fn default_data_file_in(base: &std::path::Path) -> PathBuf {
    base.join(DATA_FILE)
}
