//! Observation values.
//!
//! An observation pairs a concept with a value. How the raw wire value is read depends on the
//! concept's data type; [`ObservationValue`] is the closed set of interpretations. In the store an
//! observation is `{concept, valueJSON}` with the value serialised to a string.

mod coded;
mod duration;
mod phone_number;
mod primitive;
mod question_group;

pub use coded::{AnswerSource, MultipleCodedValues, SingleCodedValue};
pub use duration::{CompositeDuration, Duration, DurationUnit};
pub use phone_number::PhoneNumber;
pub use primitive::{PrimitiveAnswer, PrimitiveValue};
pub use question_group::{QuestionGroup, RepeatableQuestionGroup};

use crate::entities::Concept;
use crate::error::AssociationError;
use crate::mapper::find_entity;
use crate::store::EntityStore;
use crate::{CoreError, CoreResult};
use fieldcare_types::{ConceptDataType, EntityType};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// An interpreted observation value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObservationValue {
    Primitive(PrimitiveValue),
    SingleCoded(SingleCodedValue),
    MultipleCoded(MultipleCodedValues),
    Duration(CompositeDuration),
    PhoneNumber(PhoneNumber),
    QuestionGroup(QuestionGroup),
    RepeatableQuestionGroup(RepeatableQuestionGroup),
}

impl ObservationValue {
    /// Interprets `raw` according to `concept`'s data type.
    ///
    /// Question-group values need the store to resolve their child concepts; see
    /// [`build_observations`]. Here they fall back to a primitive.
    pub fn for_concept(concept: &Concept, raw: &Value) -> Self {
        let datatype = concept.datatype;
        if datatype.is_coded_like() {
            match raw {
                Value::Array(items) => {
                    return ObservationValue::MultipleCoded(MultipleCodedValues::new(
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_owned)
                            .collect(),
                    ))
                }
                Value::String(answer) => {
                    return ObservationValue::SingleCoded(SingleCodedValue::new(answer.clone()))
                }
                _ => {}
            }
        }
        match datatype {
            ConceptDataType::Duration => {
                ObservationValue::Duration(CompositeDuration::from_obs(raw))
            }
            ConceptDataType::PhoneNumber => {
                ObservationValue::PhoneNumber(PhoneNumber::from_obs(raw))
            }
            _ => ObservationValue::Primitive(PrimitiveValue::new(raw.clone(), datatype)),
        }
    }

    pub fn get_value(&self) -> Value {
        match self {
            ObservationValue::Primitive(v) => v.get_value(),
            ObservationValue::SingleCoded(v) => v.get_value(),
            ObservationValue::MultipleCoded(v) => v.get_value(),
            ObservationValue::Duration(v) => v.get_value(),
            ObservationValue::PhoneNumber(v) => v.get_value(),
            ObservationValue::QuestionGroup(v) => v.get_value(),
            ObservationValue::RepeatableQuestionGroup(v) => v.get_value(),
        }
    }

    pub fn to_resource(&self) -> Value {
        match self {
            ObservationValue::Primitive(v) => v.to_resource(),
            ObservationValue::SingleCoded(v) => v.to_resource(),
            ObservationValue::MultipleCoded(v) => v.to_resource(),
            ObservationValue::Duration(v) => v.to_resource(),
            ObservationValue::PhoneNumber(v) => v.to_resource(),
            ObservationValue::QuestionGroup(v) => v.to_resource(),
            ObservationValue::RepeatableQuestionGroup(v) => v.to_resource(),
        }
    }

    pub fn clone_for_edit(&self) -> Self {
        match self {
            ObservationValue::Primitive(v) => ObservationValue::Primitive(v.clone_for_edit()),
            ObservationValue::SingleCoded(v) => ObservationValue::SingleCoded(v.clone_for_edit()),
            ObservationValue::MultipleCoded(v) => {
                ObservationValue::MultipleCoded(v.clone_for_edit())
            }
            ObservationValue::Duration(v) => ObservationValue::Duration(v.clone_for_edit()),
            ObservationValue::PhoneNumber(v) => ObservationValue::PhoneNumber(v.clone_for_edit()),
            ObservationValue::QuestionGroup(v) => {
                ObservationValue::QuestionGroup(v.clone_for_edit())
            }
            ObservationValue::RepeatableQuestionGroup(v) => {
                ObservationValue::RepeatableQuestionGroup(v.clone_for_edit())
            }
        }
    }

    pub fn is_repeatable(&self) -> bool {
        matches!(self, ObservationValue::RepeatableQuestionGroup(_))
    }

    pub fn as_question_group(&self) -> Option<&QuestionGroup> {
        match self {
            ObservationValue::QuestionGroup(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            ObservationValue::Primitive(value) => Some(value),
            _ => None,
        }
    }

    /// Selected answer uuids of a coded value.
    pub fn coded_answers(&self) -> Vec<&str> {
        match self {
            ObservationValue::SingleCoded(v) => vec![v.answer.as_str()],
            ObservationValue::MultipleCoded(v) => v.answer.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// A concept (reference copy) with its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub concept: Concept,
    pub value: ObservationValue,
}

impl Observation {
    pub fn new(concept: Concept, value: ObservationValue) -> Self {
        Self { concept, value }
    }

    pub fn concept_uuid(&self) -> &str {
        self.concept.uuid.as_str()
    }

    pub fn get_value(&self) -> Value {
        self.value.get_value()
    }

    /// `{"conceptUUID": ..., "value": ...}`
    pub fn to_resource(&self) -> Value {
        let mut resource = Map::new();
        resource.insert("conceptUUID".into(), Value::String(self.concept.uuid.to_string()));
        resource.insert("value".into(), self.value.to_resource());
        Value::Object(resource)
    }

    pub fn clone_for_edit(&self) -> Self {
        Self::new(self.concept.clone(), self.value.clone_for_edit())
    }
}

#[derive(Serialize, Deserialize)]
struct ObservationWire {
    concept: Concept,
    #[serde(rename = "valueJSON")]
    value_json: String,
}

impl Serialize for Observation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value_json = serde_json::to_string(&self.value).map_err(S::Error::custom)?;
        ObservationWire {
            concept: self.concept.clone(),
            value_json,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Observation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ObservationWire::deserialize(deserializer)?;
        let value = serde_json::from_str(&wire.value_json).map_err(D::Error::custom)?;
        Ok(Observation::new(wire.concept, value))
    }
}

// ============================================================================
// Building from the wire
// ============================================================================

/// Builds the observations carried by a resource field.
///
/// `raw` is either a map of concept uuid to raw value, or a list of
/// `{"conceptUUID", "value"}` entries. Each concept must already be in the store. Question-group
/// concepts take a map (one group) or a list of maps (repeatable groups) and are built
/// recursively.
///
/// # Errors
///
/// Returns [`CoreError::Association`] (owner to `Concept`) for an unknown concept, and
/// [`CoreError::InvalidInput`] for a field of the wrong shape.
pub fn build_observations(
    store: &dyn EntityStore,
    owner_type: EntityType,
    owner_uuid: &str,
    raw: Option<&Value>,
) -> CoreResult<Vec<Observation>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    observation_pairs(raw)?
        .into_iter()
        .map(|(concept_uuid, value)| -> CoreResult<Observation> {
            let concept = find_entity::<Concept>(store, &concept_uuid)?.ok_or_else(|| {
                AssociationError::new(
                    owner_type,
                    EntityType::Concept,
                    owner_uuid,
                    Some(concept_uuid.clone()),
                )
            })?;
            let value = build_value(store, owner_type, owner_uuid, &concept, &value)?;
            Ok(Observation::new(concept.clone_for_reference(), value))
        })
        .collect()
}

/// Wire form of a list of observations.
pub fn observations_to_resource(observations: &[Observation]) -> Value {
    Value::Array(observations.iter().map(Observation::to_resource).collect())
}

pub fn find_observation<'a>(
    observations: &'a [Observation],
    concept_uuid: &str,
) -> Option<&'a Observation> {
    observations
        .iter()
        .find(|obs| obs.concept_uuid() == concept_uuid)
}

fn build_value(
    store: &dyn EntityStore,
    owner_type: EntityType,
    owner_uuid: &str,
    concept: &Concept,
    raw: &Value,
) -> CoreResult<ObservationValue> {
    if !concept.datatype.is_question_group() {
        return Ok(ObservationValue::for_concept(concept, raw));
    }
    match raw {
        Value::Array(groups) => {
            let groups = groups
                .iter()
                .map(|group| {
                    build_observations(store, owner_type, owner_uuid, Some(group))
                        .map(QuestionGroup::new)
                })
                .collect::<CoreResult<Vec<_>>>()?;
            Ok(ObservationValue::RepeatableQuestionGroup(
                RepeatableQuestionGroup::new(groups),
            ))
        }
        Value::Object(_) => Ok(ObservationValue::QuestionGroup(QuestionGroup::new(
            build_observations(store, owner_type, owner_uuid, Some(raw))?,
        ))),
        _ => Ok(ObservationValue::for_concept(concept, raw)),
    }
}

fn observation_pairs(raw: &Value) -> CoreResult<Vec<(String, Value)>> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| -> CoreResult<(String, Value)> {
                let concept_uuid = item
                    .get("conceptUUID")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CoreError::InvalidInput(format!("observation without conceptUUID: {item}"))
                    })?;
                let value = item.get("value").cloned().unwrap_or(Value::Null);
                Ok((concept_uuid.to_owned(), value))
            })
            .collect(),
        other => Err(CoreError::InvalidInput(format!(
            "observations must be an object or a list, got: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::save_entity;
    use crate::store::{InMemoryStore, UpdateMode};
    use fieldcare_uuid::EntityUuid;
    use serde_json::json;

    fn concept(uuid: &str, datatype: ConceptDataType) -> Concept {
        Concept::create(
            format!("concept {uuid}"),
            datatype,
            Vec::new(),
            EntityUuid::from_wire(uuid).expect("uuid"),
        )
    }

    fn store_with(concepts: &[Concept]) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        for c in concepts {
            save_entity(&mut store, c, UpdateMode::All).expect("seed concept");
        }
        store
    }

    #[test]
    fn dispatches_by_datatype() {
        let coded = concept("c1", ConceptDataType::Coded);
        assert!(matches!(
            ObservationValue::for_concept(&coded, &json!("a1")),
            ObservationValue::SingleCoded(_)
        ));
        assert!(matches!(
            ObservationValue::for_concept(&coded, &json!(["a1", "a2"])),
            ObservationValue::MultipleCoded(_)
        ));

        let duration = concept("c2", ConceptDataType::Duration);
        assert!(matches!(
            ObservationValue::for_concept(&duration, &json!({"durations": []})),
            ObservationValue::Duration(_)
        ));

        let phone = concept("c3", ConceptDataType::PhoneNumber);
        assert!(matches!(
            ObservationValue::for_concept(&phone, &json!({"phoneNumber": "1"})),
            ObservationValue::PhoneNumber(_)
        ));

        let text = concept("c4", ConceptDataType::Text);
        assert!(matches!(
            ObservationValue::for_concept(&text, &json!("x")),
            ObservationValue::Primitive(_)
        ));
    }

    #[test]
    fn builds_question_groups_recursively() {
        let group = concept("qg", ConceptDataType::QuestionGroup);
        let weight = concept("w", ConceptDataType::Numeric);
        let store = store_with(&[group, weight]);

        let observations = build_observations(
            &store,
            EntityType::Encounter,
            "e1",
            Some(&json!({"qg": [{"w": "12.5"}, {"w": "13"}]})),
        )
        .expect("built");

        assert_eq!(observations.len(), 1);
        match &observations[0].value {
            ObservationValue::RepeatableQuestionGroup(groups) => {
                assert_eq!(groups.groups().len(), 2);
                assert_eq!(
                    groups.groups()[0].get_observation_value("w"),
                    Some(json!(12.5))
                );
            }
            other => panic!("expected RepeatableQuestionGroup, got {other:?}"),
        }
        assert_eq!(
            observations[0].to_resource(),
            json!({"conceptUUID": "qg", "value": [{"w": 12.5}, {"w": 13.0}]})
        );
    }

    #[test]
    fn unknown_concept_is_association_error() {
        let store = InMemoryStore::new();
        let err = build_observations(&store, EntityType::Individual, "i1", Some(&json!({"c9": 1})))
            .expect_err("should fail");
        match err {
            CoreError::Association(assoc) => {
                assert_eq!(assoc.code(), "Individual-Concept-Association");
                assert_eq!(assoc.parent_uuid.as_deref(), Some("c9"));
            }
            other => panic!("expected Association, got {other:?}"),
        }
    }

    #[test]
    fn accepts_list_form() {
        let store = store_with(&[concept("t", ConceptDataType::Text)]);
        let observations = build_observations(
            &store,
            EntityType::Encounter,
            "e1",
            Some(&json!([{"conceptUUID": "t", "value": "note"}])),
        )
        .expect("built");
        assert_eq!(
            find_observation(&observations, "t").map(Observation::get_value),
            Some(json!("note"))
        );
    }

    #[test]
    fn object_form_keeps_wire_order() {
        let store = store_with(&[
            concept("zz-weight", ConceptDataType::Numeric),
            concept("aa-height", ConceptDataType::Numeric),
            concept("qg", ConceptDataType::QuestionGroup),
        ]);
        let observations = build_observations(
            &store,
            EntityType::Individual,
            "i1",
            Some(&json!({
                "zz-weight": 60,
                "aa-height": 170,
                "qg": {"zz-weight": 61, "aa-height": 171}
            })),
        )
        .expect("built");

        let order: Vec<&str> = observations.iter().map(Observation::concept_uuid).collect();
        assert_eq!(order, vec!["zz-weight", "aa-height", "qg"]);
        match &observations[2].value {
            ObservationValue::QuestionGroup(group) => {
                let children: Vec<&str> = group
                    .group_observations
                    .iter()
                    .map(Observation::concept_uuid)
                    .collect();
                assert_eq!(children, vec!["zz-weight", "aa-height"]);
            }
            other => panic!("expected QuestionGroup, got {other:?}"),
        }
    }

    #[test]
    fn stored_form_carries_value_json() {
        let obs = Observation::new(
            concept("c1", ConceptDataType::Coded),
            ObservationValue::SingleCoded(SingleCodedValue::new("a1")),
        );

        let stored = serde_json::to_value(&obs).expect("serialize");
        let value_json = stored["valueJSON"].as_str().expect("string valueJSON");
        assert!(value_json.contains("\"answer\":\"a1\""));

        let back: Observation = serde_json::from_value(stored).expect("deserialize");
        assert_eq!(back, obs);
    }
}
