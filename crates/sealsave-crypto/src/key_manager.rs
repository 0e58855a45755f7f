use std::sync::{Arc, RwLock};

use sealsave_core::{KeyError, KeyMaterial, KeyStore};
use tracing::{info, warn};

use crate::random::generate_key_material;

enum KeyState {
    Uninitialized,
    Ready(KeyMaterial),
}

/// Holds the single active key/IV for the process.
///
/// `Uninitialized -> Ready -> (reset) -> Uninitialized`. The manager is an
/// explicit context object: the persistence facade owns it and hands it to
/// every serializer call. Resetting while saves or loads are in flight is a
/// caller error; nothing here serializes those against each other.
pub struct KeyManager {
    default_store: Arc<dyn KeyStore>,
    store: RwLock<Option<Arc<dyn KeyStore>>>,
    state: RwLock<KeyState>,
}

impl KeyManager {
    /// New, uninitialized manager. `default_store` is used when `initialize`
    /// is called without an explicit backend.
    pub fn new(default_store: Arc<dyn KeyStore>) -> Self {
        Self {
            default_store,
            store: RwLock::new(None),
            state: RwLock::new(KeyState::Uninitialized),
        }
    }

    /// Load the stored key/IV, or generate and persist a fresh pair.
    ///
    /// No-op (with a warning) when already initialized.
    pub fn initialize(&self, store: Option<Arc<dyn KeyStore>>) -> Result<(), KeyError> {
        let mut state = self.state.write().map_err(lock_err)?;
        if matches!(*state, KeyState::Ready(_)) {
            warn!("key manager already initialized");
            return Ok(());
        }

        let store = store.unwrap_or_else(|| Arc::clone(&self.default_store));
        let material = match store.load_key() {
            Some(material) => {
                info!(backend = store.name(), "loaded encryption key");
                material
            }
            None => {
                info!(
                    backend = store.name(),
                    "no usable encryption key stored; generating a new key and iv"
                );
                let material = generate_key_material();
                store.save_key(&material)?;
                info!(backend = store.name(), "generated and stored new key and iv");
                material
            }
        };

        *self.store.write().map_err(lock_err)? = Some(store);
        *state = KeyState::Ready(material);
        Ok(())
    }

    /// Delete the stored key/IV and return to `Uninitialized`.
    ///
    /// Safe to call repeatedly; deletion is attempted every time against the
    /// last backend used (or the default one).
    pub fn reset_keys(&self) -> Result<(), KeyError> {
        let mut state = self.state.write().map_err(lock_err)?;
        let store = self
            .store
            .read()
            .map_err(lock_err)?
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.default_store));

        *state = KeyState::Uninitialized;
        store.delete_key()?;
        info!(backend = store.name(), "encryption keys reset");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.state
            .read()
            .map(|state| matches!(*state, KeyState::Ready(_)))
            .unwrap_or(false)
    }

    /// Active key material; fails fast while uninitialized.
    pub fn material(&self) -> Result<KeyMaterial, KeyError> {
        match &*self.state.read().map_err(lock_err)? {
            KeyState::Ready(material) => Ok(material.clone()),
            KeyState::Uninitialized => Err(KeyError::Uninitialized),
        }
    }
}

fn lock_err<E: std::fmt::Display>(err: E) -> KeyError {
    KeyError::Lock(err.to_string())
}
