//! In-memory [`EntityStore`].
//!
//! Records are held per entity type, keyed by uuid. Owned collection fields are stored
//! normalised: when a record is written, every object in one of its collection fields is written
//! to the child type's table (with the same [`UpdateMode`]) and replaced by its uuid. Reads
//! materialise those links back into full child records, recursively. Links to children that no
//! longer exist are dropped on read.

use crate::store::{Criteria, EntityStore, Record, UpdateMode};
use crate::{CoreError, CoreResult};
use fieldcare_types::EntityType;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: HashMap<EntityType, BTreeMap<String, Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record of `entity_type`, materialised, ordered by uuid.
    pub fn all(&self, entity_type: EntityType) -> Vec<Record> {
        self.tables
            .get(&entity_type)
            .map(|table| {
                table
                    .values()
                    .map(|stored| self.materialise(entity_type, stored))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The stored (link-normalised) form of a record.
    pub fn raw(&self, entity_type: EntityType, uuid: &str) -> Option<&Record> {
        self.tables.get(&entity_type)?.get(uuid)
    }

    fn materialise(&self, entity_type: EntityType, stored: &Record) -> Record {
        let mut record = stored.clone();
        for assoc in entity_type.child_associations() {
            let Some(Value::Array(links)) = stored.get(assoc.collection) else {
                continue;
            };
            let children: Vec<Record> = links
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|uuid| self.raw(assoc.child, uuid))
                .map(|child| self.materialise(assoc.child, child))
                .collect();
            record.set_collection(assoc.collection, children);
        }
        record
    }

    fn normalise(
        &mut self,
        entity_type: EntityType,
        mut record: Record,
        mode: UpdateMode,
    ) -> CoreResult<Record> {
        for assoc in entity_type.child_associations() {
            let Some(Value::Array(items)) = record.remove(assoc.collection) else {
                continue;
            };
            let mut links = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(uuid) => links.push(Value::String(uuid)),
                    Value::Object(map) => {
                        let child = Record::from(map);
                        let uuid = child.uuid().map(str::to_owned).ok_or_else(|| {
                            CoreError::InvalidInput(format!(
                                "{} in {}.{} has no uuid",
                                assoc.child, entity_type, assoc.collection
                            ))
                        })?;
                        self.create(assoc.child, child, mode)?;
                        links.push(Value::String(uuid));
                    }
                    other => {
                        return Err(CoreError::InvalidInput(format!(
                            "unexpected element in {}.{}: {other}",
                            entity_type, assoc.collection
                        )))
                    }
                }
            }
            record.set(assoc.collection, Value::Array(links));
        }
        Ok(record)
    }
}

impl EntityStore for InMemoryStore {
    fn find_by_key(&self, field: &str, value: &str, entity_type: EntityType) -> Option<Record> {
        let table = self.tables.get(&entity_type)?;
        let stored = if field == "uuid" {
            table.get(value)
        } else {
            table
                .values()
                .find(|r| r.lookup_path(field).and_then(Value::as_str) == Some(value))
        }?;
        Some(self.materialise(entity_type, stored))
    }

    fn find_all_by_criteria(
        &self,
        criteria: &str,
        entity_type: EntityType,
    ) -> CoreResult<Vec<Record>> {
        let criteria = Criteria::parse(criteria)?;
        let Some(table) = self.tables.get(&entity_type) else {
            return Ok(Vec::new());
        };
        Ok(table
            .values()
            .filter(|stored| criteria.matches(stored))
            .map(|stored| self.materialise(entity_type, stored))
            .collect())
    }

    fn delete_objects(
        &mut self,
        owner_uuid: &str,
        entity_type: EntityType,
        collection_field: &str,
    ) -> CoreResult<()> {
        if let Some(record) = self
            .tables
            .get_mut(&entity_type)
            .and_then(|table| table.get_mut(owner_uuid))
        {
            record.set(collection_field, Value::Array(Vec::new()));
        }
        Ok(())
    }

    fn delete_by_key(&mut self, entity_type: EntityType, uuid: &str) -> CoreResult<bool> {
        Ok(self
            .tables
            .get_mut(&entity_type)
            .and_then(|table| table.remove(uuid))
            .is_some())
    }

    fn create(
        &mut self,
        entity_type: EntityType,
        record: Record,
        mode: UpdateMode,
    ) -> CoreResult<()> {
        let uuid = record.uuid().map(str::to_owned).ok_or_else(|| {
            CoreError::InvalidInput(format!("{entity_type} record has no uuid"))
        })?;
        let record = self.normalise(entity_type, record, mode)?;
        let table = self.tables.entry(entity_type).or_default();

        if mode == UpdateMode::Modified {
            if let Some(existing) = table.get_mut(&uuid) {
                for (field, value) in record.into_map() {
                    existing.set(field, value);
                }
                return Ok(());
            }
        }
        table.insert(uuid, record);
        Ok(())
    }

    fn count(&self, entity_type: EntityType) -> usize {
        self.tables.get(&entity_type).map_or(0, BTreeMap::len)
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
    fn modified_merges_only_supplied_fields() {
        let mut store = InMemoryStore::new();
        store
            .create(
                EntityType::Gender,
                record(json!({"uuid": "g1", "name": "Female", "voided": false})),
                UpdateMode::All,
            )
            .expect("create");
        store
            .create(
                EntityType::Gender,
                record(json!({"uuid": "g1", "voided": true})),
                UpdateMode::Modified,
            )
            .expect("update");

        let stored = store
            .find_by_key("uuid", "g1", EntityType::Gender)
            .expect("stored gender");
        assert_eq!(stored.get("name"), Some(&json!("Female")));
        assert!(stored.voided());
    }

    #[test]
    fn all_mode_replaces_record() {
        let mut store = InMemoryStore::new();
        store
            .create(
                EntityType::Gender,
                record(json!({"uuid": "g1", "name": "Female"})),
                UpdateMode::All,
            )
            .expect("create");
        store
            .create(EntityType::Gender, record(json!({"uuid": "g1"})), UpdateMode::All)
            .expect("replace");

        let stored = store
            .find_by_key("uuid", "g1", EntityType::Gender)
            .expect("stored gender");
        assert!(stored.get("name").is_none());
    }

    #[test]
    fn collections_are_linked_and_materialised() {
        let mut store = InMemoryStore::new();
        store
            .create(
                EntityType::Form,
                record(json!({"uuid": "f1", "formElementGroups": [
                    {"uuid": "g1", "name": "First", "formElements": [{"uuid": "fe1"}]}
                ]})),
                UpdateMode::Modified,
            )
            .expect("create form");

        assert_eq!(store.count(EntityType::FormElementGroup), 1);
        assert_eq!(store.count(EntityType::FormElement), 1);
        assert_eq!(
            store.raw(EntityType::Form, "f1").and_then(|r| r.get("formElementGroups")),
            Some(&json!(["g1"]))
        );

        // a later write to the child is visible through the parent
        store
            .create(
                EntityType::FormElementGroup,
                record(json!({"uuid": "g1", "name": "Renamed"})),
                UpdateMode::Modified,
            )
            .expect("update group");

        let form = store
            .find_by_key("uuid", "f1", EntityType::Form)
            .expect("stored form");
        let groups = form.collection("formElementGroups");
        assert_eq!(groups[0].get("name"), Some(&json!("Renamed")));
        assert_eq!(groups[0].collection("formElements")[0].uuid(), Some("fe1"));
    }

    #[test]
    fn find_by_non_key_field() {
        let mut store = InMemoryStore::new();
        store
            .create(
                EntityType::EntitySyncStatus,
                record(json!({"uuid": "s1", "entityName": "Form"})),
                UpdateMode::All,
            )
            .expect("create");

        assert!(store
            .find_by_key("entityName", "Form", EntityType::EntitySyncStatus)
            .is_some());
        assert!(store
            .find_by_key("entityName", "Concept", EntityType::EntitySyncStatus)
            .is_none());
    }

    #[test]
    fn criteria_filters_and_delete_removes() {
        let mut store = InMemoryStore::new();
        for (uuid, st) in [("d1", "st1"), ("d2", "st2"), ("d3", "st1")] {
            store
                .create(
                    EntityType::DraftSubject,
                    record(json!({"uuid": uuid, "subjectType": {"uuid": st}})),
                    UpdateMode::All,
                )
                .expect("create draft");
        }

        let matches = store
            .find_all_by_criteria("subjectType.uuid = 'st1'", EntityType::DraftSubject)
            .expect("valid criteria");
        assert_eq!(matches.len(), 2);

        assert!(store.delete_by_key(EntityType::DraftSubject, "d1").expect("delete"));
        assert!(!store.delete_by_key(EntityType::DraftSubject, "d1").expect("delete"));
        assert_eq!(store.count(EntityType::DraftSubject), 2);
    }

    #[test]
    fn delete_objects_empties_embedded_list() {
        let mut store = InMemoryStore::new();
        store
            .create(
                EntityType::Concept,
                record(json!({"uuid": "c1", "keyValues": [{"key": "k", "value": "v"}]})),
                UpdateMode::All,
            )
            .expect("create");

        store
            .delete_objects("c1", EntityType::Concept, "keyValues")
            .expect("delete objects");

        let concept = store
            .find_by_key("uuid", "c1", EntityType::Concept)
            .expect("concept");
        assert_eq!(concept.get("keyValues"), Some(&json!([])));
    }

    #[test]
    fn create_requires_uuid() {
        let mut store = InMemoryStore::new();
        let err = store
            .create(EntityType::Gender, record(json!({"name": "x"})), UpdateMode::All)
            .expect_err("should reject");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }
}
