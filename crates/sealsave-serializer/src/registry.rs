use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use sealsave_core::SaveError;
use tracing::{error, info, warn};

use crate::{
    encrypted::{binary_json_serializer, configurable_json_serializer, structural_json_serializer},
    Serializer,
};

/// Format-keyed set of serializer plugins. Ids are case-insensitive.
#[derive(Default)]
pub struct SerializerRegistry {
    serializers: RwLock<HashMap<String, Arc<dyn Serializer>>>,
}

impl SerializerRegistry {
    /// Empty registry with no formats.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with `json`, `json-config` and `json-bin`.
    pub fn with_builtin() -> Self {
        let registry = Self::empty();
        registry.register(Arc::new(configurable_json_serializer()));
        registry.register(Arc::new(structural_json_serializer()));
        registry.register(Arc::new(binary_json_serializer()));
        registry
    }

    /// Add a plugin. A duplicate id keeps the existing plugin, logs a warning
    /// and returns `false`.
    pub fn register(&self, serializer: Arc<dyn Serializer>) -> bool {
        let id = normalize(serializer.format_id());
        let mut serializers = match self.serializers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if serializers.contains_key(&id) {
            warn!(format = serializer.format_id(), "serializer format already registered");
            return false;
        }
        info!(format = serializer.format_id(), "registered serializer");
        serializers.insert(id, serializer);
        true
    }

    /// Look up a plugin by format id.
    pub fn resolve(&self, format_id: &str) -> Result<Arc<dyn Serializer>, SaveError> {
        let id = normalize(format_id);
        if id.is_empty() {
            error!("serializer format id is empty");
            return Err(SaveError::validation("serializer format id is empty"));
        }
        let serializers = match self.serializers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        serializers.get(&id).cloned().ok_or_else(|| {
            error!(format = format_id, "unsupported serializer format");
            SaveError::UnsupportedFormat {
                format: format_id.to_string(),
            }
        })
    }

    /// Registered ids, sorted.
    pub fn formats(&self) -> Vec<String> {
        let serializers = match self.serializers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut ids: Vec<String> = serializers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn normalize(format_id: &str) -> String {
    format_id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::StructuralJsonCodec, EncryptedJsonSerializer, Encoding};

    #[test]
    fn builtin_formats_are_registered() {
        let registry = SerializerRegistry::with_builtin();
        assert_eq!(registry.formats(), vec!["json", "json-bin", "json-config"]);
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = SerializerRegistry::with_builtin();
        let serializer = registry.resolve("JSON-Config").expect("resolve");
        assert_eq!(serializer.format_id(), "json-config");
    }

    #[test]
    fn unknown_format_is_unsupported() {
        let registry = SerializerRegistry::with_builtin();
        let err = registry.resolve("xml").err().expect("xml is not registered");
        assert!(matches!(err, SaveError::UnsupportedFormat { format } if format == "xml"));
    }

    #[test]
    fn empty_format_is_a_validation_error() {
        let registry = SerializerRegistry::with_builtin();
        let err = registry.resolve("  ").err().expect("empty id");
        assert!(matches!(err, SaveError::Validation { .. }));
    }

    #[test]
    fn duplicate_registration_keeps_first_plugin() {
        let registry = SerializerRegistry::with_builtin();
        let duplicate = EncryptedJsonSerializer::new(
            "JSON",
            StructuralJsonCodec::compact(),
            Encoding::RawBytes,
        );
        assert!(!registry.register(Arc::new(duplicate)));
        assert_eq!(registry.formats().len(), 3);
        assert_eq!(registry.resolve("json").expect("resolve").format_id(), "json");
    }

    #[test]
    fn runtime_registration_adds_format() {
        let registry = SerializerRegistry::empty();
        assert!(registry.formats().is_empty());
        let custom = EncryptedJsonSerializer::new(
            "Compact",
            StructuralJsonCodec::compact(),
            Encoding::Base64Text,
        );
        assert!(registry.register(Arc::new(custom)));
        assert!(registry.resolve("compact").is_ok());
    }
}
