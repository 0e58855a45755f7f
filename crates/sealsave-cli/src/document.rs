use color_eyre::{eyre::eyre, Result};
use sealsave_core::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object persisted from the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    name: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Document {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Map::new(),
        }
    }

    /// Wrap a JSON object; the top-level `name` member is reserved.
    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(eyre!("input must be a JSON object"));
        };
        if fields.contains_key("name") {
            return Err(eyre!(
                "top-level `name` is reserved for the record name; rename that member"
            ));
        }
        Ok(Self {
            name: name.to_string(),
            fields,
        })
    }

    pub fn probe(name: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("probe".into(), Value::Bool(true));
        fields.insert("written_by".into(), Value::String("sealsave".into()));
        Self {
            name: name.to_string(),
            fields,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Record for Document {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use sealsave_core::RecordState;
    use serde_json::json;

    use super::*;

    #[test]
    fn rejects_reserved_name_member() {
        assert!(Document::from_value("x", json!({ "name": "clash" })).is_err());
        assert!(Document::from_value("x", json!("text")).is_err());
    }

    #[test]
    fn snapshot_flattens_fields_next_to_name() {
        let doc = Document::from_value("stats", json!({ "health": 100 })).expect("doc");
        let snapshot = doc.snapshot().expect("snapshot");
        assert_eq!(snapshot, json!({ "name": "stats", "health": 100 }));
    }

    #[test]
    fn overwrite_keeps_name_and_merges_fields() {
        let mut doc = Document::empty("stats");
        doc.overwrite(json!({ "health": 5, "mana": 2 }))
            .expect("overwrite");
        assert_eq!(doc.name(), "stats");
        assert_eq!(doc.fields().len(), 2);
    }
}
