use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by key stores and the key lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Backing settings store could not be read or written.
    #[error("key storage failure: {reason}")]
    Storage { reason: String },
    /// OS keyring rejected the operation.
    #[error("keyring error: {0}")]
    Keyring(String),
    /// Key material was requested before `initialize` (or after a reset).
    #[error("key manager is not initialized")]
    Uninitialized,
    /// Internal state lock was poisoned by a panicking holder.
    #[error("lock poisoned: {0}")]
    Lock(String),
}

/// Errors surfaced by serializers and the persistence facade.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Caller input rejected before any I/O (empty batch, bad file name).
    #[error("validation failed: {reason}")]
    Validation { reason: String },
    /// No serializer registered under the requested format id.
    #[error("unsupported serializer format: {format}")]
    UnsupportedFormat { format: String },
    /// Nothing stored at the resolved path.
    #[error("no saved data at {}", path.display())]
    NotFound { path: PathBuf },
    /// Read or write failure at the resolved path.
    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Ciphertext could not be decrypted (wrong key, corruption, bad encoding).
    #[error("decryption failed: {0}")]
    Decryption(String),
    /// Structural (de)serialization failure.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Key material unavailable.
    #[error(transparent)]
    Key(#[from] KeyError),
}

impl SaveError {
    pub fn validation(reason: impl Into<String>) -> Self {
        SaveError::Validation {
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error, promoting `NotFound` to the dedicated variant.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            SaveError::NotFound { path }
        } else {
            SaveError::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SaveError::NotFound { .. })
    }
}
