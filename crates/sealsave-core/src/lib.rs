//! Core contracts for Sealsave: key material, key storage, persistable records
//! and the shared error taxonomy. Kept free of crypto and I/O dependencies.

pub mod error;
pub mod keys;
pub mod record;

pub use error::{KeyError, SaveError};
pub use keys::{InMemoryKeyStore, KeyMaterial, KeyStore, IV_LEN, KEY_LEN};
pub use record::{Record, RecordState};
