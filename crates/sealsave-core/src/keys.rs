use std::{
    fmt,
    sync::{Arc, Mutex},
};

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyError;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// Symmetric key and IV used for every encryption in the process.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl KeyMaterial {
    pub fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Build from untrusted slices; wrong lengths yield `None`.
    pub fn from_slices(key: &[u8], iv: &[u8]) -> Option<Self> {
        if key.len() != KEY_LEN || iv.len() != IV_LEN {
            return None;
        }
        let mut material = Self {
            key: [0u8; KEY_LEN],
            iv: [0u8; IV_LEN],
        };
        material.key.copy_from_slice(key);
        material.iv.copy_from_slice(iv);
        Some(material)
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

// Never print key bytes.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

/// Persistence backend for the process key/IV pair.
///
/// Absence is not an error: `load_key` returns `None` both on first run and
/// when stored material is malformed, so callers regenerate instead of failing.
pub trait KeyStore: Send + Sync {
    /// Short backend name used for logging.
    fn name(&self) -> &'static str;

    /// Persist the key/IV, replacing anything stored before.
    fn save_key(&self, material: &KeyMaterial) -> Result<(), KeyError>;

    /// Load previously stored material, or `None` if absent or invalid.
    fn load_key(&self) -> Option<KeyMaterial>;

    /// Remove stored material (idempotent).
    fn delete_key(&self) -> Result<(), KeyError>;
}

/// Process-local key store for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyStore {
    inner: Arc<Mutex<Option<KeyMaterial>>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for InMemoryKeyStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn save_key(&self, material: &KeyMaterial) -> Result<(), KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Lock(err.to_string()))?;
        *guard = Some(material.clone());
        Ok(())
    }

    fn load_key(&self) -> Option<KeyMaterial> {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(err) => {
                tracing::error!("in-memory key store lock poisoned: {err}");
                None
            }
        }
    }

    fn delete_key(&self) -> Result<(), KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Lock(err.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slices_rejects_wrong_lengths() {
        assert!(KeyMaterial::from_slices(&[0u8; 31], &[0u8; IV_LEN]).is_none());
        assert!(KeyMaterial::from_slices(&[0u8; KEY_LEN], &[0u8; 15]).is_none());
        assert!(KeyMaterial::from_slices(&[7u8; KEY_LEN], &[9u8; IV_LEN]).is_some());
    }

    #[test]
    fn debug_output_redacts_bytes() {
        let material = KeyMaterial::new([0xAB; KEY_LEN], [0xCD; IV_LEN]);
        let rendered = format!("{material:?}");
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains("171"));
    }

    #[test]
    fn memory_store_round_trips_and_deletes() {
        let store = InMemoryKeyStore::new();
        assert!(store.load_key().is_none());

        let material = KeyMaterial::new([1u8; KEY_LEN], [2u8; IV_LEN]);
        store.save_key(&material).expect("save");
        assert_eq!(store.load_key(), Some(material));

        store.delete_key().expect("delete");
        store.delete_key().expect("delete again");
        assert!(store.load_key().is_none());
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = InMemoryKeyStore::new();
        let handle = store.clone();
        store
            .save_key(&KeyMaterial::new([3u8; KEY_LEN], [4u8; IV_LEN]))
            .expect("save");
        assert!(handle.load_key().is_some());
    }
}
