use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// Which backend holds the encryption key.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreKind {
    /// Key/value settings file next to the config.
    #[default]
    Settings,
    /// OS keychain.
    Keyring,
}

/// User-level configuration loaded from `~/.config/sealsave/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the save directory.
    pub data_dir: Option<PathBuf>,
    /// Serializer used when a command gives no `--format`.
    pub default_format: Option<String>,
    /// Key backend.
    #[serde(default)]
    pub key_store: KeyStoreKind,
    /// Override for the settings file holding the key (settings backend only).
    pub settings_path: Option<PathBuf>,
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg.normalized())
}

impl Config {
    /// Format ids are matched case-insensitively; a blank id means "unset".
    fn normalized(mut self) -> Self {
        self.default_format = self
            .default_format
            .map(|format| format.trim().to_lowercase())
            .filter(|format| !format.is_empty());
        self
    }
}

/// Directory holding config and key settings.
pub fn config_root() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("sealsave"))
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    Ok(config_root()?.join("config.toml"))
}

/// Write the given config to disk unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_to_path_if_missing(config, &default_path()?)
}

fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}
