use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sealsave_core::{KeyError, KeyMaterial, KeyStore};
use tempfile::NamedTempFile;
use toml::Value;
use tracing::{debug, error, info, warn};

const KEY_PREFIX: &str = "EncryptionKey_";

/// Settings entry holding the base64 key.
pub const KEY_ENTRY: &str = "EncryptionKey_Key";
/// Settings entry holding the base64 IV.
pub const IV_ENTRY: &str = "EncryptionKey_IV";

/// Key store backed by a small persistent key/value settings file (TOML).
///
/// Other entries in the file are preserved across writes. A file that does
/// not parse reads as "no key" and is replaced on the next write.
#[derive(Debug, Clone)]
pub struct SettingsKeyStore {
    path: PathBuf,
}

type Settings = BTreeMap<String, Value>;

impl SettingsKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_contents(&self) -> Result<Option<String>, KeyError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_err(err)),
        }
    }

    fn read_settings(&self) -> Result<Settings, KeyError> {
        match self.read_contents()? {
            Some(contents) => toml::from_str(&contents).map_err(storage_err),
            None => Ok(Settings::new()),
        }
    }

    /// Settings to rewrite, and whether the file on disk must be replaced
    /// because it does not parse.
    fn settings_for_write(&self) -> Result<(Settings, bool), KeyError> {
        let Some(contents) = self.read_contents()? else {
            return Ok((Settings::new(), false));
        };
        match toml::from_str(&contents) {
            Ok(settings) => Ok((settings, false)),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    "replacing unreadable settings file: {err}"
                );
                Ok((Settings::new(), true))
            }
        }
    }

    fn write_settings(&self, settings: &Settings) -> Result<(), KeyError> {
        let parent = self.path.parent().ok_or_else(|| KeyError::Storage {
            reason: "invalid settings path".to_string(),
        })?;
        fs::create_dir_all(parent).map_err(storage_err)?;

        let body = toml::to_string(settings).map_err(storage_err)?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
        tmp.write_all(body.as_bytes()).map_err(storage_err)?;
        tmp.flush().map_err(storage_err)?;
        tmp.persist(&self.path).map_err(|e| storage_err(e.error))?;
        Ok(())
    }
}

impl KeyStore for SettingsKeyStore {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn save_key(&self, material: &KeyMaterial) -> Result<(), KeyError> {
        let (mut settings, _) = self.settings_for_write()?;
        settings.insert(KEY_ENTRY.to_string(), Value::String(STANDARD.encode(material.key())));
        settings.insert(IV_ENTRY.to_string(), Value::String(STANDARD.encode(material.iv())));
        self.write_settings(&settings)?;
        debug!(path = %self.path.display(), "stored key material in settings");
        Ok(())
    }

    fn load_key(&self) -> Option<KeyMaterial> {
        let settings = match self.read_settings() {
            Ok(settings) => settings,
            Err(err) => {
                error!("failed to read key settings: {err}");
                return None;
            }
        };

        let (Some(key_entry), Some(iv_entry)) = (settings.get(KEY_ENTRY), settings.get(IV_ENTRY))
        else {
            warn!(path = %self.path.display(), "no encryption key in settings");
            return None;
        };
        let (Some(key_b64), Some(iv_b64)) = (key_entry.as_str(), iv_entry.as_str()) else {
            warn!(path = %self.path.display(), "stored key material is not text");
            return None;
        };

        let decoded = STANDARD
            .decode(key_b64)
            .and_then(|key| STANDARD.decode(iv_b64).map(|iv| (key, iv)));
        match decoded {
            Ok((key, iv)) => KeyMaterial::from_slices(&key, &iv).or_else(|| {
                warn!(
                    key_len = key.len(),
                    iv_len = iv.len(),
                    "stored key material has invalid length"
                );
                None
            }),
            Err(err) => {
                error!("failed to decode stored key material: {err}");
                None
            }
        }
    }

    fn delete_key(&self) -> Result<(), KeyError> {
        let (mut settings, unreadable) = self.settings_for_write()?;
        let before = settings.len();
        settings.retain(|entry, _| !entry.starts_with(KEY_PREFIX));
        if unreadable || settings.len() != before {
            self.write_settings(&settings)?;
        }
        info!(path = %self.path.display(), "deleted key material from settings");
        Ok(())
    }
}

fn storage_err<E: ToString>(err: E) -> KeyError {
    KeyError::Storage {
        reason: err.to_string(),
    }
}
