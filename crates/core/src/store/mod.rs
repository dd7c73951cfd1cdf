//! Persistence boundary.
//!
//! The core never owns durable storage. It talks to whatever backs the device through the
//! [`EntityStore`] trait, exchanging store-native [`Record`]s (keyed JSON objects, one per
//! entity). An [`InMemoryStore`] ships with the crate for tests and the replay tool.
//!
//! Store semantics the core relies on:
//! - records are keyed by `uuid` within an entity type
//! - an owned collection field (see [`EntityType::child_associations`]) links to child records
//!   of the child type; reading a parent returns its children materialised in link order
//! - [`UpdateMode::Modified`] merges only the top-level fields present in the written record

mod criteria;
mod memory;

pub use criteria::Criteria;
pub use memory::InMemoryStore;

use crate::{CoreError, CoreResult};
use fieldcare_types::EntityType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How [`EntityStore::create`] treats an existing record with the same uuid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    /// Replace the whole record.
    All,
    /// Merge the supplied top-level fields into the existing record (insert if absent).
    Modified,
}

/// Store operations consumed by the core.
pub trait EntityStore {
    /// Finds the record of `entity_type` whose `field` equals `value`.
    fn find_by_key(&self, field: &str, value: &str, entity_type: EntityType) -> Option<Record>;

    /// Finds every record of `entity_type` matching `criteria` (see [`Criteria`]).
    ///
    /// An empty criteria string matches every record.
    fn find_all_by_criteria(&self, criteria: &str, entity_type: EntityType)
        -> CoreResult<Vec<Record>>;

    /// Empties an embedded value collection (one without primary keys) on the owner record so it
    /// can be replaced.
    fn delete_objects(
        &mut self,
        owner_uuid: &str,
        entity_type: EntityType,
        collection_field: &str,
    ) -> CoreResult<()>;

    /// Deletes a record; returns whether it existed.
    fn delete_by_key(&mut self, entity_type: EntityType, uuid: &str) -> CoreResult<bool>;

    /// Writes a record.
    fn create(&mut self, entity_type: EntityType, record: Record, mode: UpdateMode)
        -> CoreResult<()>;

    /// Number of records held for `entity_type`.
    fn count(&self, entity_type: EntityType) -> usize;
}

/// A store-native record: one entity as a keyed JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::InvalidInput(format!(
                "record must be a JSON object, got: {other}"
            ))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn uuid(&self) -> Option<&str> {
        self.0.get("uuid").and_then(Value::as_str)
    }

    pub fn voided(&self) -> bool {
        self.0.get("voided").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Resolves a dotted path (`subjectType.uuid`) through nested objects.
    pub fn lookup_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Copy-on-read projection: the named scalar fields plus the named list fields.
    ///
    /// An absent list field is projected as an empty list.
    pub fn pick(&self, scalar_fields: &[&str], list_fields: &[&str]) -> Record {
        let mut projection = Map::new();
        for field in scalar_fields {
            if let Some(value) = self.0.get(*field) {
                projection.insert((*field).to_owned(), value.clone());
            }
        }
        for field in list_fields {
            let list = match self.0.get(*field) {
                Some(Value::Array(items)) => Value::Array(items.clone()),
                _ => Value::Array(Vec::new()),
            };
            projection.insert((*field).to_owned(), list);
        }
        Record(projection)
    }

    /// Object elements of a list field, as records.
    pub fn collection(&self, field: &str) -> Vec<Record> {
        match self.0.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().cloned().map(Record))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_collection(&mut self, field: &str, records: Vec<Record>) {
        let items = records.into_iter().map(Value::from).collect();
        self.0.insert(field.to_owned(), Value::Array(items));
    }

    /// Returns a copy without the named fields.
    pub fn without_fields(&self, fields: &[&str]) -> Record {
        let mut map = self.0.clone();
        for field in fields {
            map.remove(*field);
        }
        Record(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).expect("object record")
    }

    #[test]
    fn pick_keeps_named_fields_and_defaults_lists() {
        let r = record(json!({"uuid": "i1", "name": "A", "enrolments": [{"uuid": "e1"}]}));
        let p = r.pick(&["uuid"], &["enrolments", "encounters"]);

        assert_eq!(p.uuid(), Some("i1"));
        assert!(p.get("name").is_none());
        assert_eq!(p.collection("enrolments").len(), 1);
        assert_eq!(p.get("encounters"), Some(&json!([])));
    }

    #[test]
    fn lookup_path_walks_nested_objects() {
        let r = record(json!({"subjectType": {"uuid": "st1"}, "name": "x"}));

        assert_eq!(r.lookup_path("subjectType.uuid"), Some(&json!("st1")));
        assert_eq!(r.lookup_path("name.uuid"), None);
        assert_eq!(r.lookup_path("gender.uuid"), None);
    }

    #[test]
    fn voided_defaults_to_false() {
        assert!(!record(json!({"uuid": "a"})).voided());
    }
}
