use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gridbase_engine::Value;

/// A record's values keyed by field id in string form.
pub type ValueMap = BTreeMap<String, Value>;

/// A row of a table. `data` is the stored value document, normally an
/// object keyed by field id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    pub table_id: Uuid,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Record {
    pub fn new(table_id: Uuid) -> Record {
        Record {
            id: Uuid::new_v4(),
            table_id,
            data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Builder-style setter for tests and fixtures.
    pub fn with_value(mut self, field_id: Uuid, value: impl Into<serde_json::Value>) -> Record {
        if !self.data.is_object() {
            self.data = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.data.as_object_mut() {
            map.insert(field_id.to_string(), value.into());
        }
        self
    }

    /// The stored value of a field, or `Null` when absent.
    pub fn get(&self, field_id: Uuid) -> Value {
        self.data
            .get(field_id.to_string())
            .map(Value::from)
            .unwrap_or_default()
    }

    /// The stored document as a value map. A document that is not an object
    /// reads as empty.
    pub fn value_map(&self) -> ValueMap {
        match &self.data {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(key, value)| (key.clone(), Value::from(value)))
                .collect(),
            other => {
                log::warn!(
                    "record {}: stored data is {} rather than an object, treating as empty",
                    self.id,
                    json_type_name(other)
                );
                ValueMap::new()
            }
        }
    }

    /// A copy of this record with the given entries written over its stored
    /// document. Keys not in `updates` keep their stored JSON untouched.
    pub fn with_updates(&self, updates: ValueMap) -> Record {
        let mut data = match &self.data {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        for (key, value) in updates {
            data.insert(key, serde_json::Value::from(value));
        }
        Record {
            id: self.id,
            table_id: self.table_id,
            data: serde_json::Value::Object(data),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
