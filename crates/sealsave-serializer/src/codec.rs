use std::collections::BTreeSet;

use serde_json::Value;

/// Structural half of a format plugin: JSON tree <-> JSON text.
pub trait JsonCodec: Send + Sync {
    fn encode(&self, value: Value) -> Result<String, serde_json::Error>;
    fn decode(&self, json: &str) -> Result<Value, serde_json::Error>;
}

/// Writes every serialized field as-is, nulls included.
#[derive(Debug, Clone, Copy)]
pub struct StructuralJsonCodec {
    pretty: bool,
}

impl StructuralJsonCodec {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl JsonCodec for StructuralJsonCodec {
    fn encode(&self, value: Value) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
    }

    fn decode(&self, json: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Field names dropped by [`ConfigurableJsonCodec::new`].
pub const DEFAULT_EXCLUDED_FIELDS: [&str; 2] = ["name", "hide_flags"];

/// JSON codec with a field exclusion list.
///
/// Excluded top-level fields are neither written nor read back, null members
/// are omitted on save at every depth, and output is pretty printed.
#[derive(Debug, Clone)]
pub struct ConfigurableJsonCodec {
    excluded: BTreeSet<String>,
}

impl ConfigurableJsonCodec {
    pub fn new() -> Self {
        Self::with_excluded_fields(DEFAULT_EXCLUDED_FIELDS)
    }

    pub fn with_excluded_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn excluded_fields(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }

    fn strip_excluded(&self, value: &mut Value) {
        if let Value::Object(members) = value {
            members.retain(|field, _| !self.excluded.contains(field));
        }
    }
}

impl Default for ConfigurableJsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonCodec for ConfigurableJsonCodec {
    fn encode(&self, mut value: Value) -> Result<String, serde_json::Error> {
        self.strip_excluded(&mut value);
        strip_nulls(&mut value);
        serde_json::to_string_pretty(&value)
    }

    fn decode(&self, json: &str) -> Result<Value, serde_json::Error> {
        let mut value: Value = serde_json::from_str(json)?;
        self.strip_excluded(&mut value);
        Ok(value)
    }
}

// Array slots are kept so element positions stay stable.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(members) => {
            members.retain(|_, member| !member.is_null());
            members.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn structural_keeps_every_field() {
        let codec = StructuralJsonCodec::pretty();
        let text = codec
            .encode(json!({ "name": "Hero", "title": null, "health": 100 }))
            .expect("encode");
        assert!(text.contains("\"name\""));
        assert!(text.contains("\"title\": null"));
        assert!(text.contains('\n'), "pretty output spans lines");
    }

    #[test]
    fn compact_output_is_single_line() {
        let text = StructuralJsonCodec::compact()
            .encode(json!({ "a": 1, "b": [1, 2] }))
            .expect("encode");
        assert_eq!(text, r#"{"a":1,"b":[1,2]}"#);
    }

    #[test]
    fn configurable_drops_excluded_and_null_fields() {
        let codec = ConfigurableJsonCodec::new();
        let text = codec
            .encode(json!({
                "name": "asset-name",
                "hide_flags": 0,
                "health": 100,
                "title": null,
                "stats": { "armor": null, "speed": 3 },
                "slots": [null, { "item": null, "count": 2 }]
            }))
            .expect("encode");

        let parsed: Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(
            parsed,
            json!({
                "health": 100,
                "stats": { "speed": 3 },
                "slots": [null, { "count": 2 }]
            })
        );
    }

    #[test]
    fn configurable_ignores_excluded_fields_on_decode() {
        let codec = ConfigurableJsonCodec::new();
        let value = codec
            .decode(r#"{ "name": "other", "health": 5, "extra": true }"#)
            .expect("decode");
        assert_eq!(value, json!({ "health": 5, "extra": true }));
    }

    #[test]
    fn custom_exclusions_replace_defaults() {
        let codec = ConfigurableJsonCodec::with_excluded_fields(["secret"]);
        assert_eq!(codec.excluded_fields().collect::<Vec<_>>(), vec!["secret"]);
        let text = codec
            .encode(json!({ "name": "kept", "secret": "x" }))
            .expect("encode");
        assert!(text.contains("kept"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(ConfigurableJsonCodec::new().decode("{ not json").is_err());
        assert!(StructuralJsonCodec::pretty().decode("").is_err());
    }
}
