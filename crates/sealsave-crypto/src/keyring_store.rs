use base64::{engine::general_purpose, Engine as _};
use sealsave_core::{KeyError, KeyMaterial, KeyStore, KEY_LEN};
use tracing::{info, warn};

use crate::random::combine_bytes;

/// OS keyring-backed store. Keeps `key || iv` as one base64 secret.
pub struct KeyringKeyStore {
    service: String,
    account: String,
}

impl KeyringKeyStore {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, KeyError> {
        keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| KeyError::Keyring(e.to_string()))
    }
}

impl KeyStore for KeyringKeyStore {
    fn name(&self) -> &'static str {
        "keyring"
    }

    fn save_key(&self, material: &KeyMaterial) -> Result<(), KeyError> {
        // Keyring operations are synchronous and may block on the platform service.
        self.entry()?
            .set_password(&encode_secret(material))
            .map_err(|e| KeyError::Keyring(e.to_string()))
    }

    fn load_key(&self) -> Option<KeyMaterial> {
        let secret = match self.entry().map(|entry| entry.get_password()) {
            Ok(Ok(secret)) => secret,
            Ok(Err(keyring::Error::NoEntry)) => {
                warn!(service = %self.service, "no encryption key in keyring");
                return None;
            }
            Ok(Err(err)) => {
                warn!("failed to read key from keyring: {err}");
                return None;
            }
            Err(err) => {
                warn!("{err}");
                return None;
            }
        };
        decode_secret(&secret)
    }

    fn delete_key(&self) -> Result<(), KeyError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                info!(service = %self.service, "deleted key material from keyring");
                Ok(())
            }
            Err(err) => Err(KeyError::Keyring(err.to_string())),
        }
    }
}

fn encode_secret(material: &KeyMaterial) -> String {
    general_purpose::STANDARD.encode(combine_bytes(material.key(), material.iv()))
}

fn decode_secret(secret: &str) -> Option<KeyMaterial> {
    let bytes = match general_purpose::STANDARD.decode(secret) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("stored keyring secret is not base64: {err}");
            return None;
        }
    };
    if bytes.len() < KEY_LEN {
        warn!(len = bytes.len(), "stored keyring secret too short");
        return None;
    }
    let (key, iv) = bytes.split_at(KEY_LEN);
    KeyMaterial::from_slices(key, iv)
}
