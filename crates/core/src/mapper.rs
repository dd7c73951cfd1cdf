//! Entity mapper.
//!
//! Translates between store-native [`Record`]s and typed entity structs. Every persisted entity
//! implements [`Entity`]; its serde form *is* its record form, so mapping is a serde round trip.
//! Deserialisation goes through `serde_path_to_error` so a record that does not fit its type is
//! reported with the offending field path.

use crate::collection::Keyed;
use crate::store::{EntityStore, Record, UpdateMode};
use crate::{CoreError, CoreResult};
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// An independently persisted domain object.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Store schema of this entity.
    const TYPE: EntityType;

    fn uuid(&self) -> &EntityUuid;

    fn voided(&self) -> bool {
        false
    }
}

impl<T: Entity> Keyed for T {
    fn key(&self) -> &str {
        self.uuid().as_str()
    }

    fn is_voided(&self) -> bool {
        self.voided()
    }
}

/// Maps an entity to its store record.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if the entity cannot be serialised, and
/// [`CoreError::InvalidInput`] if it does not serialise to an object.
pub fn to_record<T: Entity>(entity: &T) -> CoreResult<Record> {
    let value = serde_json::to_value(entity).map_err(|source| CoreError::Serialization {
        entity_type: T::TYPE,
        source,
    })?;
    Record::from_value(value)
}

/// Maps a store record to its entity.
///
/// # Errors
///
/// Returns [`CoreError::Mapping`], naming the offending field path, if the record does not fit
/// `T`.
pub fn to_entity<T: Entity>(record: Record) -> CoreResult<T> {
    let value = Value::from(record);
    serde_path_to_error::deserialize(value).map_err(|err| CoreError::Mapping {
        entity_type: T::TYPE,
        path: err.path().to_string(),
        message: err.inner().to_string(),
    })
}

/// Maps a list of records, stopping at the first that does not fit.
///
/// # Errors
///
/// See [`to_entity`].
pub fn to_entity_list<T: Entity>(records: Vec<Record>) -> CoreResult<Vec<T>> {
    records.into_iter().map(to_entity).collect()
}

/// Looks an entity up by uuid.
///
/// # Errors
///
/// Returns [`CoreError::Mapping`] if a record is found but does not fit `T`.
pub fn find_entity<T: Entity>(store: &dyn EntityStore, uuid: &str) -> CoreResult<Option<T>> {
    store
        .find_by_key("uuid", uuid, T::TYPE)
        .map(to_entity)
        .transpose()
}

/// Every entity of type `T` matching `criteria`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCriteria`] for a malformed expression and
/// [`CoreError::Mapping`] for a record that does not fit `T`.
pub fn find_all_entities<T: Entity>(store: &dyn EntityStore, criteria: &str) -> CoreResult<Vec<T>> {
    to_entity_list(store.find_all_by_criteria(criteria, T::TYPE)?)
}

/// Writes an entity, with its owned collections, to the store.
///
/// # Errors
///
/// Propagates mapping and store errors.
pub fn save_entity<T: Entity>(
    store: &mut dyn EntityStore,
    entity: &T,
    mode: UpdateMode,
) -> CoreResult<()> {
    store.create(T::TYPE, to_record(entity)?, mode)
}
