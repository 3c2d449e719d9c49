//! Change-tracked key/value record.
//!
//! A [`Record`] holds arbitrary JSON fields and remembers, for every field
//! written since the last clean checkpoint, the value it had at that
//! checkpoint. Models use the change set to send partial updates.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Before/after pair for a dirty field.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Value at the last clean checkpoint (`null` if the field was absent)
    pub before: Value,
    /// Value written since (`null` if the field was deleted)
    pub after: Value,
}

/// Ordered JSON map with per-field change tracking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Map<String, Value>,
    changes: BTreeMap<String, Change>,
}

impl Record {
    /// Create an empty, clean record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Current value of a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Current value of a boolean field.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Current value of an integer field.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Write a field, recording the change against its checkpoint value.
    ///
    /// Writing the checkpoint value back removes the field from the change
    /// set.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        let checkpoint = match self.changes.get(&key) {
            Some(change) => change.before.clone(),
            None => self.values.get(&key).cloned().unwrap_or(Value::Null),
        };

        if checkpoint == value {
            self.changes.remove(&key);
        } else {
            self.changes.insert(
                key.clone(),
                Change {
                    before: checkpoint,
                    after: value.clone(),
                },
            );
        }

        self.values.insert(key, value);
    }

    /// Remove a field. The removal is tracked like a write of `null`.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.set(key, Value::Null);
        self.values.remove(key)
    }

    /// Merge fields into the record; each write is tracked.
    pub fn update(&mut self, data: Map<String, Value>) {
        for (key, value) in data {
            self.set(key, value);
        }
    }

    /// Replace every field with `data`.
    ///
    /// Existing fields are deleted, then `data` is written. Fields whose
    /// final value matches their checkpoint end up clean.
    pub fn replace_all(&mut self, data: Map<String, Value>) {
        self.clear_all();
        self.update(data);
    }

    /// Delete every field.
    pub fn clear_all(&mut self) {
        let keys: Vec<String> = self.values.keys().cloned().collect();
        for key in keys {
            self.delete(&key);
        }
    }

    /// Forget all changes; current values become the new checkpoint.
    pub fn mark_clean(&mut self) {
        self.changes.clear();
    }

    /// Keys of all dirty fields, in key order.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.changes.keys().map(String::as_str).collect()
    }

    /// Whether any field is dirty.
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Whether the given field is dirty.
    pub fn is_field_dirty(&self, key: &str) -> bool {
        self.changes.contains_key(key)
    }

    /// Checkpoint value of a dirty field.
    pub fn value_before_change(&self, key: &str) -> Option<&Value> {
        self.changes.get(key).map(|c| &c.before)
    }

    /// Change recorded for a field.
    pub fn change(&self, key: &str) -> Option<&Change> {
        self.changes.get(key)
    }

    /// The full change set.
    pub fn changes(&self) -> &BTreeMap<String, Change> {
        &self.changes
    }

    /// Dirty fields with their current values.
    ///
    /// Fields deleted since the checkpoint map to `null` so the server clears
    /// them.
    pub fn changed_values(&self) -> Map<String, Value> {
        self.changes
            .keys()
            .map(|key| {
                let value = self.values.get(key).cloned().unwrap_or(Value::Null);
                (key.clone(), value)
            })
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Current values as a JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Current values as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl From<Map<String, Value>> for Record {
    /// Build a clean record holding `values`.
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values,
            changes: BTreeMap::new(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
