use std::path::Path;

use async_trait::async_trait;
use sealsave_core::{KeyMaterial, RecordState, SaveError};
use sealsave_crypto::{cipher, KeyManager};
use tracing::{debug, error, instrument};

use crate::{
    codec::{ConfigurableJsonCodec, JsonCodec, StructuralJsonCodec},
    file_io, Serializer, BINARY_JSON, CONFIGURABLE_JSON, STRUCTURAL_JSON,
};

/// On-disk representation of the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Base64 ciphertext stored as UTF-8 text.
    Base64Text,
    /// Raw ciphertext bytes.
    RawBytes,
}

/// Generic plugin: a [`JsonCodec`] composed with the cipher helper.
pub struct EncryptedJsonSerializer<C: JsonCodec> {
    format_id: String,
    codec: C,
    encoding: Encoding,
}

impl<C: JsonCodec> EncryptedJsonSerializer<C> {
    pub fn new(format_id: impl Into<String>, codec: C, encoding: Encoding) -> Self {
        Self {
            format_id: format_id.into(),
            codec,
            encoding,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn seal(&self, material: &KeyMaterial, record: &dyn RecordState) -> Result<Vec<u8>, SaveError> {
        let json = self.codec.encode(record.snapshot()?)?;
        let sealed = match self.encoding {
            Encoding::Base64Text => cipher::encrypt_string(&json, material)?.into_bytes(),
            Encoding::RawBytes => cipher::encrypt_bytes(json.as_bytes(), material)?,
        };
        Ok(sealed)
    }

    fn open(&self, material: &KeyMaterial, stored: &[u8]) -> Result<String, SaveError> {
        let json = match self.encoding {
            Encoding::Base64Text => {
                let text = std::str::from_utf8(stored).map_err(|_| {
                    SaveError::Decryption("stored ciphertext is not base64 text".to_string())
                })?;
                cipher::decrypt_string(text, material)?
            }
            Encoding::RawBytes => {
                let plain = cipher::decrypt_bytes(stored, material)?;
                String::from_utf8(plain).map_err(|_| {
                    SaveError::Decryption("decrypted payload is not valid UTF-8".to_string())
                })?
            }
        };
        Ok(json)
    }

    fn populate(&self, record: &mut dyn RecordState, json: &str) -> Result<(), SaveError> {
        let value = self.codec.decode(json)?;
        record.overwrite(value)?;
        Ok(())
    }
}

#[async_trait]
impl<C: JsonCodec> Serializer for EncryptedJsonSerializer<C> {
    fn format_id(&self) -> &str {
        &self.format_id
    }

    #[instrument(skip_all, fields(format = %self.format_id, path = %path.display()))]
    fn serialize(
        &self,
        keys: &KeyManager,
        record: &dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError> {
        let sealed = self.seal(&keys.material()?, record)?;
        file_io::write_file(path, &sealed).inspect_err(|err| error!("save failed: {err}"))?;
        debug!(record = record.record_name(), "saved encrypted record");
        Ok(())
    }

    #[instrument(skip_all, fields(format = %self.format_id, path = %path.display()))]
    async fn serialize_async(
        &self,
        keys: &KeyManager,
        record: &dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError> {
        let sealed = self.seal(&keys.material()?, record)?;
        file_io::write_file_async(path, &sealed)
            .await
            .inspect_err(|err| error!("save failed: {err}"))?;
        debug!(record = record.record_name(), "saved encrypted record");
        Ok(())
    }

    #[instrument(skip_all, fields(format = %self.format_id, path = %path.display()))]
    fn deserialize(
        &self,
        keys: &KeyManager,
        record: &mut dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError> {
        let material = keys.material()?;
        let stored = file_io::read_file(path).inspect_err(|err| error!("load failed: {err}"))?;
        let json = self
            .open(&material, &stored)
            .inspect_err(|err| error!("load failed: {err}"))?;
        self.populate(record, &json)
            .inspect_err(|err| error!("load failed: {err}"))?;
        debug!(record = record.record_name(), "loaded encrypted record");
        Ok(())
    }

    #[instrument(skip_all, fields(format = %self.format_id, path = %path.display()))]
    async fn deserialize_async(
        &self,
        keys: &KeyManager,
        record: &mut dyn RecordState,
        path: &Path,
    ) -> Result<(), SaveError> {
        let material = keys.material()?;
        let stored = file_io::read_file_async(path)
            .await
            .inspect_err(|err| error!("load failed: {err}"))?;
        let json = self
            .open(&material, &stored)
            .inspect_err(|err| error!("load failed: {err}"))?;
        self.populate(record, &json)
            .inspect_err(|err| error!("load failed: {err}"))?;
        debug!(record = record.record_name(), "loaded encrypted record");
        Ok(())
    }

    #[instrument(skip_all, fields(format = %self.format_id, path = %path.display()))]
    fn deserialize_to_string(&self, keys: &KeyManager, path: &Path) -> Result<String, SaveError> {
        let material = keys.material()?;
        let stored = file_io::read_file(path).inspect_err(|err| error!("load failed: {err}"))?;
        let json = self
            .open(&material, &stored)
            .inspect_err(|err| error!("load failed: {err}"))?;
        debug!(bytes = json.len(), "decrypted record to string");
        Ok(json)
    }
}

/// Structural-reflection JSON: every serialized field, pretty printed, base64 file.
pub fn structural_json_serializer() -> EncryptedJsonSerializer<StructuralJsonCodec> {
    EncryptedJsonSerializer::new(
        STRUCTURAL_JSON,
        StructuralJsonCodec::pretty(),
        Encoding::Base64Text,
    )
}

/// Configurable JSON with the default exclusion list, base64 file.
pub fn configurable_json_serializer() -> EncryptedJsonSerializer<ConfigurableJsonCodec> {
    EncryptedJsonSerializer::new(
        CONFIGURABLE_JSON,
        ConfigurableJsonCodec::new(),
        Encoding::Base64Text,
    )
}

/// Compact JSON stored as raw ciphertext bytes.
pub fn binary_json_serializer() -> EncryptedJsonSerializer<StructuralJsonCodec> {
    EncryptedJsonSerializer::new(BINARY_JSON, StructuralJsonCodec::compact(), Encoding::RawBytes)
}
