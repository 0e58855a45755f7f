use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// A structured object the host application persists.
///
/// The name identifies the record inside batch operations
/// (`{base}_{name}.dat`).
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    fn name(&self) -> &str;

    /// Adopt the state rebuilt from a load.
    ///
    /// `loaded` is deserialized from the current state merged with the
    /// file, so members serde never reads (`#[serde(skip)]`) come back as
    /// their `Default`. Override to carry such members over from `self`.
    fn populate_from(&mut self, loaded: Self) {
        *self = loaded;
    }
}

/// Object-safe view of a [`Record`] used by serializer plugins.
///
/// Implemented for every `Record`; plugins only ever see `dyn RecordState`.
pub trait RecordState: Send + Sync {
    fn record_name(&self) -> &str;

    /// Current state as a JSON tree.
    fn snapshot(&self) -> Result<Value, serde_json::Error>;

    /// Populate in place from a decoded JSON tree.
    ///
    /// Top-level members present in `incoming` replace the current ones;
    /// members it lacks keep their current values. Unknown members are
    /// dropped by the record's own deserializer. The rebuilt value is handed
    /// to [`Record::populate_from`].
    fn overwrite(&mut self, incoming: Value) -> Result<(), serde_json::Error>;
}

impl<T: Record> RecordState for T {
    fn record_name(&self) -> &str {
        self.name()
    }

    fn snapshot(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn overwrite(&mut self, incoming: Value) -> Result<(), serde_json::Error> {
        let mut current = serde_json::to_value(&*self)?;
        merge_members(&mut current, incoming);
        let loaded: T = serde_json::from_value(current)?;
        self.populate_from(loaded);
        Ok(())
    }
}

fn merge_members(current: &mut Value, incoming: Value) {
    match (current, incoming) {
        (Value::Object(existing), Value::Object(members)) => {
            for (field, value) in members {
                existing.insert(field, value);
            }
        }
        (slot, other) => *slot = other,
    }
}
