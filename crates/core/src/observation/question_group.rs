use super::Observation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Child observations answered together under one question-group concept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGroup {
    #[serde(default)]
    pub group_observations: Vec<Observation>,
}

impl QuestionGroup {
    pub fn new(group_observations: Vec<Observation>) -> Self {
        Self { group_observations }
    }

    pub fn find_observation(&self, concept_uuid: &str) -> Option<&Observation> {
        self.group_observations
            .iter()
            .find(|obs| obs.concept.uuid == concept_uuid)
    }

    pub fn get_observation_value(&self, concept_uuid: &str) -> Option<Value> {
        self.find_observation(concept_uuid).map(Observation::get_value)
    }

    pub fn is_empty(&self) -> bool {
        self.group_observations.is_empty()
    }

    pub fn size(&self) -> usize {
        self.group_observations.len()
    }

    pub fn get_value(&self) -> Value {
        Value::Array(
            self.group_observations
                .iter()
                .map(|obs| {
                    let mut entry = Map::new();
                    entry.insert("conceptUUID".into(), Value::String(obs.concept.uuid.to_string()));
                    entry.insert("value".into(), obs.get_value());
                    Value::Object(entry)
                })
                .collect(),
        )
    }

    /// Concept uuid to child value.
    pub fn to_resource(&self) -> Value {
        Value::Object(
            self.group_observations
                .iter()
                .map(|obs| (obs.concept.uuid.to_string(), obs.value.to_resource()))
                .collect(),
        )
    }

    pub fn clone_for_edit(&self) -> Self {
        Self::new(
            self.group_observations
                .iter()
                .map(Observation::clone_for_edit)
                .collect(),
        )
    }
}

/// An ordered list of answered question groups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatableQuestionGroup {
    #[serde(default)]
    pub repeatable_observations: Vec<QuestionGroup>,
}

impl RepeatableQuestionGroup {
    pub fn new(repeatable_observations: Vec<QuestionGroup>) -> Self {
        Self {
            repeatable_observations,
        }
    }

    pub fn groups(&self) -> &[QuestionGroup] {
        &self.repeatable_observations
    }

    pub fn is_empty(&self) -> bool {
        self.repeatable_observations.iter().all(QuestionGroup::is_empty)
    }

    pub fn get_value(&self) -> Value {
        Value::Array(
            self.repeatable_observations
                .iter()
                .map(QuestionGroup::get_value)
                .collect(),
        )
    }

    pub fn to_resource(&self) -> Value {
        Value::Array(
            self.repeatable_observations
                .iter()
                .map(QuestionGroup::to_resource)
                .collect(),
        )
    }

    pub fn clone_for_edit(&self) -> Self {
        Self::new(
            self.repeatable_observations
                .iter()
                .map(QuestionGroup::clone_for_edit)
                .collect(),
        )
    }
}
