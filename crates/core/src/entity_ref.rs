//! Typed back-references.
//!
//! A child never embeds its owning parent; it holds an [`EntityRef`] to it. The reference is
//! stored as `{"uuid": "..."}` so that store criteria can address it as `<role>.uuid`.

use crate::mapper::{find_entity, Entity};
use crate::store::EntityStore;
use crate::CoreResult;
use fieldcare_uuid::EntityUuid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub struct EntityRef<T> {
    uuid: EntityUuid,
    marker: PhantomData<fn() -> T>,
}

impl<T> EntityRef<T> {
    pub fn new(uuid: EntityUuid) -> Self {
        Self {
            uuid,
            marker: PhantomData,
        }
    }

    pub fn uuid(&self) -> &EntityUuid {
        &self.uuid
    }

    pub fn as_str(&self) -> &str {
        self.uuid.as_str()
    }
}

impl<T: Entity> EntityRef<T> {
    /// Loads the referenced entity from the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Mapping`](crate::CoreError::Mapping) if the stored record does not fit
    /// `T`.
    pub fn resolve(&self, store: &dyn EntityStore) -> CoreResult<Option<T>> {
        find_entity(store, self.uuid.as_str())
    }
}

impl<T: Entity> From<&T> for EntityRef<T> {
    fn from(entity: &T) -> Self {
        Self::new(entity.uuid().clone())
    }
}

impl<T> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        Self::new(self.uuid.clone())
    }
}

impl<T> PartialEq for EntityRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<T> Eq for EntityRef<T> {}

impl<T> Hash for EntityRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<T> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityRef").field(&self.uuid.as_str()).finish()
    }
}

impl<T> fmt::Display for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uuid.as_str())
    }
}

// ============================================================================
// Serde
// ============================================================================

#[derive(Serialize)]
struct RefWire<'a> {
    uuid: &'a EntityUuid,
}

/// Accepts `{"uuid": ...}` (extra fields ignored) or a bare uuid string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RefInput {
    Object { uuid: EntityUuid },
    Bare(EntityUuid),
}

impl<T> Serialize for EntityRef<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        RefWire { uuid: &self.uuid }.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for EntityRef<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let uuid = match RefInput::deserialize(deserializer)? {
            RefInput::Object { uuid } | RefInput::Bare(uuid) => uuid,
        };
        Ok(Self::new(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Marker;

    fn uuid(s: &str) -> EntityUuid {
        EntityUuid::from_wire(s).expect("uuid")
    }

    #[test]
    fn serialises_as_uuid_object() {
        let r: EntityRef<Marker> = EntityRef::new(uuid("i1"));
        assert_eq!(serde_json::to_value(&r).expect("serialize"), json!({"uuid": "i1"}));
    }

    #[test]
    fn deserialises_object_or_bare_string() {
        let from_object: EntityRef<Marker> =
            serde_json::from_value(json!({"uuid": "i1", "name": "ignored"})).expect("object");
        let from_string: EntityRef<Marker> = serde_json::from_value(json!("i1")).expect("string");

        assert_eq!(from_object, from_string);
        assert_eq!(from_object.as_str(), "i1");
    }

    #[test]
    fn blank_uuid_is_rejected() {
        assert!(serde_json::from_value::<EntityRef<Marker>>(json!({"uuid": " "})).is_err());
    }
}
