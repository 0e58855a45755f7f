//! Pluggable serialization formats for Sealsave.
//!
//! Every plugin turns a record into a structural JSON document, encrypts it
//! with the active key material and writes it to disk; loading reverses the
//! pipeline and populates an existing record in place.

pub mod codec;
pub mod encrypted;
pub mod file_io;
pub mod registry;

use std::path::Path;

use async_trait::async_trait;
use sealsave_core::{RecordState, SaveError};
use sealsave_crypto::KeyManager;

pub use codec::{ConfigurableJsonCodec, JsonCodec, StructuralJsonCodec};
pub use encrypted::{
    binary_json_serializer, configurable_json_serializer, structural_json_serializer,
    EncryptedJsonSerializer, Encoding,
};
pub use registry::SerializerRegistry;

/// Format id of the structural-reflection JSON plugin.
pub const STRUCTURAL_JSON: &str = "json";
/// Format id of the configurable JSON plugin (facade default).
pub const CONFIGURABLE_JSON: &str = "json-config";
/// Format id of the JSON plugin storing raw ciphertext bytes.
pub const BINARY_JSON: &str = "json-bin";

/// Contract every format plugin implements.
///
/// Key material is passed in on each call; plugins hold no key state.
#[async_trait]
pub trait Serializer: Send + Sync {
    /// Format id the plugin is registered under (matched case-insensitively).
    fn format_id(&self) -> &str;

    /// Encrypt and write `record` to `path`, overwriting any existing file.
    fn serialize(
        &self,
        keys: &KeyManager,
        record: &dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError>;

    async fn serialize_async(
        &self,
        keys: &KeyManager,
        record: &dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError>;

    /// Read, decrypt and populate `record` in place.
    fn deserialize(
        &self,
        keys: &KeyManager,
        record: &mut dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError>;

    async fn deserialize_async(
        &self,
        keys: &KeyManager,
        record: &mut dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError>;

    /// Decrypted JSON text without structural parsing.
    fn deserialize_to_string(&self, keys: &KeyManager, path: &Path) -> Result<String, SaveError>;
}
