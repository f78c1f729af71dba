use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{app_data_dir, config_file_in, default_data_file_in},
    errors::LedgerError,
};

const TMP_SUFFIX: &str = "tmp";

/// User preferences for the interactive session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot file; relative paths resolve against the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(default = "Config::enabled")]
    pub load_on_start: bool,
    #[serde(default = "Config::enabled")]
    pub autosave_on_exit: bool,
    #[serde(default = "Config::enabled")]
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            load_on_start: true,
            autosave_on_exit: true,
            ui_color_enabled: true,
        }
    }
}

impl Config {
    fn enabled() -> bool {
        true
    }

    /// Resolves the snapshot path against `base`.
    pub fn resolve_data_file(&self, base: &Path) -> PathBuf {
        match &self.data_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => default_data_file_in(base),
        }
    }
}

/// Loads and stores [`Config`] as JSON inside the data directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        let path = config_file_in(&base);
        Self { base, path }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configuration; a missing file yields defaults.
    pub fn load(&self) -> Result<Config, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        fs::create_dir_all(&self.base)?;
        let json = serde_json::to_string_pretty(config)?;
        let mut tmp = self.path.clone();
        tmp.set_extension(format!("json.{TMP_SUFFIX}"));
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn data_file(&self, config: &Config) -> PathBuf {
        config.resolve_data_file(&self.base)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            manager.data_file(&config),
            dir.path().join("finance_data.txt")
        );
    }

    #[test]
    fn config_roundtrips_through_disk() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().join("nested"));
        let config = Config {
            data_file: Some(PathBuf::from("books.txt")),
            autosave_on_exit: false,
            ..Config::default()
        };
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            manager.data_file(&loaded),
            dir.path().join("nested").join("books.txt")
        );
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{ "ui_color_enabled": false }"#).unwrap();
        assert!(config.load_on_start);
        assert!(config.autosave_on_exit);
        assert!(!config.ui_color_enabled);
    }

    #[test]
    fn malformed_config_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        assert!(matches!(manager.load(), Err(LedgerError::Config(_))));
    }
}
