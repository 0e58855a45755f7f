use std::{path::PathBuf, sync::Arc};

use color_eyre::{eyre::bail, Result};
use dirs::data_dir;
use sealsave_core::KeyStore;
use sealsave_crypto::{KeyManager, KeyringKeyStore, SettingsKeyStore};
use sealsave_store::SaveSystem;
use tracing::debug;

use crate::config::{self, Config, KeyStoreKind};

const KEYRING_SERVICE: &str = "sealsave";
const KEYRING_ACCOUNT: &str = "data-key";

/// Resolve the default save directory.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("sealsave"))
}

/// Key backend selected by config.
pub fn key_store_from_config(config: &Config) -> Result<Arc<dyn KeyStore>> {
    let store: Arc<dyn KeyStore> = match config.key_store {
        KeyStoreKind::Settings => {
            let path = match &config.settings_path {
                Some(path) => path.clone(),
                None => config::config_root()?.join("settings.toml"),
            };
            debug!(?path, "using settings key store");
            Arc::new(SettingsKeyStore::new(path))
        }
        KeyStoreKind::Keyring => {
            debug!("using keyring key store");
            Arc::new(KeyringKeyStore::new(KEYRING_SERVICE, KEYRING_ACCOUNT))
        }
    };
    Ok(store)
}

/// Build the save facade (keys not yet initialized).
pub fn save_system_from_config(config: &Config) -> Result<SaveSystem> {
    let root = match &config.data_dir {
        Some(root) => root.clone(),
        None => default_data_dir()?,
    };
    debug!(?root, "initializing save system");
    let keys = KeyManager::new(key_store_from_config(config)?);
    let system = SaveSystem::new(root, keys);
    let Some(format) = &config.default_format else {
        return Ok(system);
    };
    if let Err(err) = system.registry().resolve(format) {
        bail!(
            "config default_format `{format}` is not usable ({err}); known formats: {}",
            system.registry().formats().join(", ")
        );
    }
    Ok(system.with_default_format(format.clone()))
}

/// Facade rooted at a temp dir with an in-memory key, for tests.
#[cfg(test)]
pub fn test_system(root: impl Into<PathBuf>) -> SaveSystem {
    let keys = KeyManager::new(Arc::new(sealsave_core::InMemoryKeyStore::new()));
    SaveSystem::new(root, keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_overrides_are_applied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config {
            data_dir: Some(dir.path().join("saves")),
            default_format: Some("json-bin".into()),
            key_store: KeyStoreKind::Settings,
            settings_path: Some(dir.path().join("keys.toml")),
        };

        let system = save_system_from_config(&cfg).expect("build");
        assert_eq!(system.root(), dir.path().join("saves"));
        assert_eq!(system.default_format(), "json-bin");

        system.keys().initialize(None).expect("init keys");
        assert!(dir.path().join("keys.toml").exists());
    }

    #[test]
    fn unknown_default_format_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config {
            data_dir: Some(dir.path().join("saves")),
            default_format: Some("xml".into()),
            key_store: KeyStoreKind::Settings,
            settings_path: Some(dir.path().join("keys.toml")),
        };

        let err = save_system_from_config(&cfg)
            .err()
            .expect("xml is not registered");
        assert!(err.to_string().contains("json-config"));
        assert!(!dir.path().join("keys.toml").exists());
    }

    #[test]
    fn keyring_backend_is_selectable() {
        let cfg = Config {
            key_store: KeyStoreKind::Keyring,
            ..Config::default()
        };
        let store = key_store_from_config(&cfg).expect("store");
        assert_eq!(store.name(), "keyring");
    }
}
