//! Concepts and their coded answers.

use super::base_resource;
use crate::association::ParentEntity;
use crate::collection::ChildCollection;
use crate::constants::{NONE_CONCEPT_UUID, OTHER_CONCEPT_UUID, STANDARD_ANSWER_ORDER};
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::merge::merge_child;
use crate::observation::ObservationValue;
use crate::CoreResult;
use fieldcare_types::{ConceptDataType, EntityType};
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::Resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An embedded key/value setting on a concept. Key-values have no identity of their own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    fn from_resource(value: &Value) -> Option<Self> {
        let key = value.get("key")?.as_str()?;
        Some(Self::new(key, value.get("value").cloned().unwrap_or(Value::Null)))
    }

    pub fn get_value(&self) -> &Value {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub uuid: EntityUuid,
    pub name: String,
    pub datatype: ConceptDataType,
    #[serde(default)]
    pub answers: ChildCollection<ConceptAnswer>,
    #[serde(default)]
    pub low_absolute: Option<f64>,
    #[serde(default)]
    pub hi_absolute: Option<f64>,
    #[serde(default)]
    pub low_normal: Option<f64>,
    #[serde(default)]
    pub hi_normal: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub key_values: Vec<KeyValue>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(Concept, EntityType::Concept);

impl ParentEntity for Concept {}

impl Concept {
    pub fn create(
        name: impl Into<String>,
        datatype: ConceptDataType,
        key_values: Vec<KeyValue>,
        uuid: EntityUuid,
    ) -> Self {
        Self {
            uuid,
            name: name.into(),
            datatype,
            answers: ChildCollection::new(),
            low_absolute: None,
            hi_absolute: None,
            low_normal: None,
            hi_normal: None,
            unit: None,
            key_values,
            voided: false,
        }
    }

    /// The copy embedded into observations and form elements.
    pub fn clone_for_reference(&self) -> Self {
        let mut concept = Concept::create(
            self.name.clone(),
            self.datatype,
            self.key_values.clone(),
            self.uuid.clone(),
        );
        concept.unit = self.unit.clone();
        concept.low_absolute = self.low_absolute;
        concept.low_normal = self.low_normal;
        concept.hi_normal = self.hi_normal;
        concept.hi_absolute = self.hi_absolute;
        concept.answers = self.answers.clone();
        concept
    }

    /// Non-voided answers by answer order, with the standard "Other" and "None" answers last.
    pub fn get_answers(&self) -> Vec<&ConceptAnswer> {
        let mut answers: Vec<&ConceptAnswer> = self.answers.non_voided().collect();
        answers.sort_by(|a, b| a.sort_order().total_cmp(&b.sort_order()));
        answers
    }

    /// Uuids of answer concepts flagged abnormal.
    pub fn abnormal_answers(&self) -> Vec<String> {
        self.answers
            .iter()
            .filter(|answer| answer.abnormal)
            .map(|answer| answer.concept.uuid.to_string())
            .collect()
    }

    /// Adds an answer unless one with the same uuid exists.
    pub fn add_answer(&mut self, answer: ConceptAnswer) -> bool {
        merge_child(&mut self.answers, answer)
    }

    /// The answer whose concept is named `answer_name`.
    pub fn get_possible_answer_concept(&self, answer_name: &str) -> Option<&ConceptAnswer> {
        self.get_answers()
            .into_iter()
            .find(|answer| answer.concept.name == answer_name)
    }

    pub fn record_by_key(&self, key: &str) -> Option<&KeyValue> {
        self.key_values.iter().find(|kv| kv.key == key)
    }

    pub fn record_value_by_key(&self, key: &str) -> Option<&Value> {
        self.record_by_key(key).map(KeyValue::get_value)
    }

    pub fn is_mobile_no(&self) -> bool {
        let flag = self
            .record_value_by_key("primary_contact")
            .or_else(|| self.record_value_by_key("contact_number"));
        flag.and_then(Value::as_str) == Some("yes")
    }

    pub fn is_question_group(&self) -> bool {
        self.datatype.is_question_group()
    }

    pub fn value_wrapper_for(&self, raw: &Value) -> ObservationValue {
        ObservationValue::for_concept(self, raw)
    }

    pub fn is_below_low_normal(&self, value: f64) -> bool {
        below(value, self.low_normal)
    }

    pub fn is_above_hi_normal(&self, value: f64) -> bool {
        above(value, self.hi_normal)
    }

    pub fn is_below_low_absolute(&self, value: f64) -> bool {
        below(value, self.low_absolute)
    }

    pub fn is_above_hi_absolute(&self, value: f64) -> bool {
        above(value, self.hi_absolute)
    }

    /// Outside the absolute range.
    pub fn violates_range(&self, value: f64) -> bool {
        self.is_above_hi_absolute(value) || self.is_below_low_absolute(value)
    }

    /// Numeric values outside the normal range, or coded values with an abnormal answer.
    pub fn is_abnormal(&self, raw: &Value) -> bool {
        let wrapper = self.value_wrapper_for(raw);
        match (self.datatype, &wrapper) {
            (ConceptDataType::Numeric, ObservationValue::Primitive(value)) => value
                .as_f64()
                .is_some_and(|v| self.is_below_low_normal(v) || self.is_above_hi_normal(v)),
            (ConceptDataType::Coded, ObservationValue::SingleCoded(value)) => {
                value.has_any_abnormal_answer(&self.abnormal_answers())
            }
            (ConceptDataType::Coded, ObservationValue::MultipleCoded(value)) => {
                value.has_any_abnormal_answer(&self.abnormal_answers())
            }
            _ => false,
        }
    }
}

fn below(value: f64, bound: Option<f64>) -> bool {
    matches!(bound, Some(b) if b.is_finite() && value.is_finite() && value < b)
}

fn above(value: f64, bound: Option<f64>) -> bool {
    matches!(bound, Some(b) if b.is_finite() && value.is_finite() && value > b)
}

impl FromResource for Concept {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let uuid = resource.uuid()?;
        let datatype = match resource.str_field("dataType").map(str::parse::<ConceptDataType>) {
            Some(Ok(datatype)) => datatype,
            Some(Err(err)) => {
                tracing::warn!(uuid = %uuid, "{err}; treating concept as NA");
                ConceptDataType::NA
            }
            None => ConceptDataType::NA,
        };

        // key-values have no primary key, so stale ones are cleared before replacement
        ctx.store_mut()
            .delete_objects(uuid.as_str(), EntityType::Concept, "keyValues")?;
        let key_values = match resource.get("keyValues") {
            Some(Value::Array(items)) => items.iter().filter_map(KeyValue::from_resource).collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            uuid,
            name: resource.string_field("name").unwrap_or_default(),
            datatype,
            answers: ChildCollection::new(),
            low_absolute: resource.f64_field("lowAbsolute"),
            hi_absolute: resource.f64_field("highAbsolute"),
            low_normal: resource.f64_field("lowNormal"),
            hi_normal: resource.f64_field("highNormal"),
            unit: resource.string_field("unit"),
            key_values,
            voided: resource.voided(),
        })
    }
}

impl ToResource for Concept {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("name", self.name.as_str())
            .insert("dataType", self.datatype.as_str())
            .insert_opt("lowAbsolute", self.low_absolute)
            .insert_opt("highAbsolute", self.hi_absolute)
            .insert_opt("lowNormal", self.low_normal)
            .insert_opt("highNormal", self.hi_normal)
            .insert_opt("unit", self.unit.clone());
        let key_values: Vec<Value> = self
            .key_values
            .iter()
            .map(|kv| serde_json::json!({"key": kv.key, "value": kv.value}))
            .collect();
        resource.insert("keyValues", key_values);
        resource
    }
}

/// One permitted answer of a coded concept. The answer is itself a concept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptAnswer {
    pub uuid: EntityUuid,
    pub concept: Concept,
    #[serde(default)]
    pub answer_order: f64,
    #[serde(default)]
    pub abnormal: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(ConceptAnswer, EntityType::ConceptAnswer);

impl ConceptAnswer {
    pub fn new(concept: Concept, answer_order: f64, abnormal: bool) -> Self {
        Self {
            uuid: EntityUuid::new(),
            concept,
            answer_order,
            abnormal,
            unique: false,
            voided: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.concept.name
    }

    fn sort_order(&self) -> f64 {
        let answer_uuid = self.concept.uuid.as_str();
        if answer_uuid == OTHER_CONCEPT_UUID || answer_uuid == NONE_CONCEPT_UUID {
            STANDARD_ANSWER_ORDER
        } else {
            self.answer_order
        }
    }
}

impl FromResource for ConceptAnswer {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let answer_concept: Concept =
            ctx.parent(EntityType::ConceptAnswer, resource, "conceptAnswerUUID")?;
        Ok(Self {
            uuid: resource.uuid()?,
            concept: answer_concept.clone_for_reference(),
            answer_order: resource.f64_field("order").unwrap_or_default(),
            abnormal: resource.bool_field("abnormal").unwrap_or(false),
            unique: resource.bool_field("unique").unwrap_or(false),
            voided: resource.voided(),
        })
    }
}

impl ToResource for ConceptAnswer {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("conceptAnswerUUID", self.concept.uuid.as_str())
            .insert("order", self.answer_order)
            .insert("abnormal", self.abnormal)
            .insert("unique", self.unique);
        resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::mapper::{find_entity, save_entity};
    use crate::store::{EntityStore, InMemoryStore, Record, UpdateMode};
    use crate::CoreError;
    use fieldcare_wire::ResourcePage;
    use serde_json::json;

    fn uuid(s: &str) -> EntityUuid {
        EntityUuid::from_wire(s).expect("uuid")
    }

    fn numeric(low_normal: Option<f64>, hi_normal: Option<f64>) -> Concept {
        let mut concept = Concept::create("Hb", ConceptDataType::Numeric, Vec::new(), uuid("hb"));
        concept.low_normal = low_normal;
        concept.hi_normal = hi_normal;
        concept
    }

    fn answer(uuid_str: &str, name: &str, order: f64) -> ConceptAnswer {
        let mut answer = ConceptAnswer::new(
            Concept::create(name, ConceptDataType::NA, Vec::new(), uuid(uuid_str)),
            order,
            false,
        );
        answer.uuid = uuid(&format!("ans-{uuid_str}"));
        answer
    }

    #[test]
    fn numeric_abnormality_uses_normal_range() {
        let concept = numeric(Some(10.0), Some(20.0));

        assert!(concept.is_abnormal(&json!(5)));
        assert!(concept.is_abnormal(&json!(25)));
        assert!(!concept.is_abnormal(&json!(10)));
        assert!(!concept.is_abnormal(&json!(15.5)));
        assert!(!concept.is_abnormal(&json!(20)));
    }

    #[test]
    fn absent_bounds_are_never_abnormal() {
        let concept = numeric(None, None);
        assert!(!concept.is_abnormal(&json!(-1000)));
        assert!(!concept.is_abnormal(&json!(1000)));

        let only_high = numeric(None, Some(f64::NAN));
        assert!(!only_high.is_abnormal(&json!(1000)));
    }

    #[test]
    fn violates_range_uses_absolute_bounds() {
        let mut concept = numeric(None, None);
        concept.low_absolute = Some(0.0);
        concept.hi_absolute = Some(300.0);

        assert!(concept.violates_range(-1.0));
        assert!(concept.violates_range(301.0));
        assert!(!concept.violates_range(150.0));
    }

    #[test]
    fn coded_abnormality_uses_flagged_answers() {
        let mut concept = Concept::create("Urine", ConceptDataType::Coded, Vec::new(), uuid("u"));
        let mut positive = answer("pos", "Positive", 1.0);
        positive.abnormal = true;
        concept.add_answer(positive);
        concept.add_answer(answer("neg", "Negative", 2.0));

        assert!(concept.is_abnormal(&json!("pos")));
        assert!(concept.is_abnormal(&json!(["neg", "pos"])));
        assert!(!concept.is_abnormal(&json!("neg")));
    }

    #[test]
    fn standard_answers_sort_last_and_voided_are_hidden() {
        let mut concept = Concept::create("Q", ConceptDataType::Coded, Vec::new(), uuid("q"));
        concept.add_answer(answer(OTHER_CONCEPT_UUID, "Other", 0.0));
        concept.add_answer(answer("b", "B", 2.0));
        concept.add_answer(answer("a", "A", 1.0));
        let mut voided = answer("v", "V", 0.5);
        voided.voided = true;
        concept.add_answer(voided);

        let names: Vec<&str> = concept.get_answers().iter().map(|a| a.name()).collect();
        assert_eq!(names, ["A", "B", "Other"]);
        assert_eq!(
            concept.get_possible_answer_concept("B").map(|a| a.answer_order),
            Some(2.0)
        );
        assert!(concept.get_possible_answer_concept("V").is_none());
    }

    #[test]
    fn mobile_number_flag() {
        let concept = Concept::create(
            "Phone",
            ConceptDataType::Text,
            vec![KeyValue::new("contact_number", json!("yes"))],
            uuid("p"),
        );
        assert!(concept.is_mobile_no());
        assert_eq!(concept.record_value_by_key("contact_number"), Some(&json!("yes")));
        assert!(!numeric(None, None).is_mobile_no());
    }

    #[test]
    fn from_resource_replaces_key_values_and_defaults_unknown_datatype() {
        let mut store = InMemoryStore::new();
        store
            .create(
                EntityType::Concept,
                Record::from_value(json!({
                    "uuid": "c1", "name": "Old", "datatype": "Text",
                    "keyValues": [{"key": "stale", "value": 1}]
                }))
                .expect("record"),
                UpdateMode::All,
            )
            .expect("seed");
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(&mut store, &page, &config);

        let resource = Resource::from_value(json!({
            "uuid": "c1", "name": "Weight", "dataType": "Mystery", "highNormal": "20",
            "keyValues": [{"key": "fresh", "value": true}]
        }))
        .expect("resource");
        let concept = Concept::from_resource(&resource, &mut ctx).expect("built");

        assert_eq!(concept.datatype, ConceptDataType::NA);
        assert_eq!(concept.hi_normal, Some(20.0));
        assert_eq!(concept.key_values, vec![KeyValue::new("fresh", json!(true))]);
        let stored = store
            .find_by_key("uuid", "c1", EntityType::Concept)
            .expect("stored");
        assert_eq!(stored.get("keyValues"), Some(&json!([])));
    }

    #[test]
    fn concept_answer_resolves_answer_concept() {
        let mut store = InMemoryStore::new();
        let yes = Concept::create("Yes", ConceptDataType::NA, Vec::new(), uuid("c1"));
        save_entity(&mut store, &yes, UpdateMode::All).expect("seed");
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(&mut store, &page, &config);

        let resource = Resource::from_value(json!({
            "uuid": "a1", "conceptAnswerUUID": "c1", "conceptUUID": "q1", "order": 3, "abnormal": true
        }))
        .expect("resource");
        let answer = ConceptAnswer::from_resource(&resource, &mut ctx).expect("built");

        assert_eq!(answer.name(), "Yes");
        assert_eq!(answer.answer_order, 3.0);
        assert!(answer.abnormal);
        assert!(!answer.voided);
        assert_eq!(
            find_entity::<Concept>(&store, "c1").expect("find").map(|c| c.name),
            Some("Yes".to_owned())
        );
    }

    #[test]
    fn concept_answer_without_answer_concept_fails() {
        let mut store = InMemoryStore::new();
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(&mut store, &page, &config);

        let resource = Resource::from_value(json!({"uuid": "a1", "conceptAnswerUUID": "c1"}))
            .expect("resource");
        match ConceptAnswer::from_resource(&resource, &mut ctx) {
            Err(CoreError::Association(err)) => {
                assert_eq!(err.code(), "ConceptAnswer-Concept-Association")
            }
            other => panic!("expected Association, got {other:?}"),
        }
    }
}
