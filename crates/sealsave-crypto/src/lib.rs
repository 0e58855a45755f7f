//! Key lifecycle and symmetric encryption for Sealsave.
//! AES-256-CBC with PKCS#7 padding; keys persisted through a `KeyStore`
//! (settings file or OS keyring).

pub mod cipher;
pub mod key_manager;
pub mod keyring_store;
pub mod random;
pub mod settings_store;

pub use cipher::CipherError;
pub use key_manager::KeyManager;
pub use keyring_store::KeyringKeyStore;
pub use settings_store::SettingsKeyStore;
