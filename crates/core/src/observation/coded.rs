use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who supplied a coded answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerSource {
    #[default]
    Manual,
    Auto,
}

/// One selected answer concept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleCodedValue {
    pub answer: String,
    #[serde(default)]
    pub answer_source: AnswerSource,
}

impl SingleCodedValue {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            answer_source: AnswerSource::Manual,
        }
    }

    pub fn has_value(&self, answer_uuid: &str) -> bool {
        self.answer == answer_uuid
    }

    pub fn has_any_abnormal_answer(&self, abnormal_answer_uuids: &[String]) -> bool {
        abnormal_answer_uuids.iter().any(|uuid| *uuid == self.answer)
    }

    pub fn get_value(&self) -> Value {
        Value::String(self.answer.clone())
    }

    pub fn to_resource(&self) -> Value {
        self.get_value()
    }

    pub fn clone_for_edit(&self) -> Self {
        self.clone()
    }
}

/// A set of selected answer concepts, in selection order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleCodedValues {
    #[serde(default)]
    pub answer: Vec<String>,
    #[serde(default)]
    pub answer_source: AnswerSource,
}

impl MultipleCodedValues {
    pub fn new(answer: Vec<String>) -> Self {
        Self {
            answer,
            answer_source: AnswerSource::Manual,
        }
    }

    /// Adds an answer unless it is already selected.
    pub fn push(&mut self, answer_uuid: impl Into<String>) -> &mut Self {
        let answer_uuid = answer_uuid.into();
        if !self.has_value(&answer_uuid) {
            self.answer.push(answer_uuid);
        }
        self
    }

    pub fn has_value(&self, answer_uuid: &str) -> bool {
        self.answer.iter().any(|a| a == answer_uuid)
    }

    pub fn remove_answer(&mut self, answer_uuid: &str) {
        self.answer.retain(|a| a != answer_uuid);
    }

    /// Selects the answer if absent, otherwise deselects it.
    pub fn toggle_answer(&mut self, answer_uuid: &str) {
        if self.has_value(answer_uuid) {
            self.remove_answer(answer_uuid);
        } else {
            self.answer.push(answer_uuid.to_owned());
        }
    }

    pub fn has_any_abnormal_answer(&self, abnormal_answer_uuids: &[String]) -> bool {
        self.answer
            .iter()
            .any(|a| abnormal_answer_uuids.iter().any(|abnormal| abnormal == a))
    }

    pub fn number_of_answers(&self) -> usize {
        self.answer.len()
    }

    pub fn get_value(&self) -> Value {
        Value::Array(self.answer.iter().cloned().map(Value::String).collect())
    }

    pub fn to_resource(&self) -> Value {
        self.get_value()
    }

    pub fn clone_for_edit(&self) -> Self {
        self.clone()
    }
}
