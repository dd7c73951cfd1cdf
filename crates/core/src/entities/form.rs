//! Forms: element groups, elements and the subject-type mappings that select them.

use super::{base_resource, Concept, DraftSubject, EntitySyncStatus, KeyValue, SubjectType};
use crate::association::ParentEntity;
use crate::collection::ChildCollection;
use crate::constants::FORM_SYNC_ENTITY_NAME;
use crate::entity_ref::EntityRef;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::mapper::{find_all_entities, to_entity, Entity};
use crate::observation::{Observation, ObservationValue, QuestionGroup, RepeatableQuestionGroup};
use crate::validation::{ValidationResult, EMPTY_VALIDATION_MESSAGE};
use crate::CoreResult;
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::Resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormType {
    IndividualProfile,
    Encounter,
    ProgramEncounter,
    ProgramEnrolment,
    ProgramExit,
    ProgramEncounterCancellation,
    ChecklistItem,
    IndividualEncounterCancellation,
    Task,
    SubjectEnrolmentEligibility,
    ManualProgramEnrolmentEligibility,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FormType {
    const KNOWN: [FormType; 11] = [
        FormType::IndividualProfile,
        FormType::Encounter,
        FormType::ProgramEncounter,
        FormType::ProgramEnrolment,
        FormType::ProgramExit,
        FormType::ProgramEncounterCancellation,
        FormType::ChecklistItem,
        FormType::IndividualEncounterCancellation,
        FormType::Task,
        FormType::SubjectEnrolmentEligibility,
        FormType::ManualProgramEnrolmentEligibility,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormType::IndividualProfile => "IndividualProfile",
            FormType::Encounter => "Encounter",
            FormType::ProgramEncounter => "ProgramEncounter",
            FormType::ProgramEnrolment => "ProgramEnrolment",
            FormType::ProgramExit => "ProgramExit",
            FormType::ProgramEncounterCancellation => "ProgramEncounterCancellation",
            FormType::ChecklistItem => "ChecklistItem",
            FormType::IndividualEncounterCancellation => "IndividualEncounterCancellation",
            FormType::Task => "Task",
            FormType::SubjectEnrolmentEligibility => "SubjectEnrolmentEligibility",
            FormType::ManualProgramEnrolmentEligibility => "ManualProgramEnrolmentEligibility",
            FormType::Unknown => "Unknown",
        }
    }

    fn from_wire(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return FormType::Unknown;
        };
        FormType::KNOWN
            .iter()
            .copied()
            .find(|t| t.as_str() == value)
            .unwrap_or_else(|| {
                tracing::warn!(form_type = value, "unknown form type");
                FormType::Unknown
            })
    }
}

// ============================================================================
// Form
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub form_type: FormType,
    #[serde(default)]
    pub form_element_groups: ChildCollection<FormElementGroup>,
    #[serde(default)]
    pub decision_rule: Option<String>,
    #[serde(default)]
    pub visit_schedule_rule: Option<String>,
    #[serde(default)]
    pub validation_rule: Option<String>,
    #[serde(default)]
    pub checklists_rule: Option<String>,
    #[serde(default)]
    pub task_schedule_rule: Option<String>,
}

impl_entity!(Form, EntityType::Form, unvoidable);

impl ParentEntity for Form {}

impl Form {
    pub fn create(name: impl Into<String>, form_type: FormType) -> Self {
        Self {
            uuid: EntityUuid::new(),
            name: name.into(),
            form_type,
            form_element_groups: ChildCollection::new(),
            decision_rule: None,
            visit_schedule_rule: None,
            validation_rule: None,
            checklists_rule: None,
            task_schedule_rule: None,
        }
    }

    pub fn add_form_element_group(&mut self, group: FormElementGroup) -> bool {
        self.form_element_groups.insert_if_absent(group)
    }

    /// Non-voided groups in display order.
    pub fn get_form_element_groups(&self) -> Vec<&FormElementGroup> {
        let mut groups: Vec<&FormElementGroup> = self.form_element_groups.non_voided().collect();
        groups.sort_by(|a, b| a.display_order.total_cmp(&b.display_order));
        groups
    }

    pub fn first_form_element_group(&self) -> Option<&FormElementGroup> {
        self.get_form_element_groups().into_iter().next()
    }

    pub fn number_of_pages(&self) -> usize {
        self.form_element_groups.non_voided().count()
    }

    pub fn form_element_group_at(&self, display_order: f64) -> Option<&FormElementGroup> {
        self.form_element_groups
            .iter()
            .find(|group| group.display_order == display_order)
    }

    pub fn find_form_element(&self, name: &str) -> Option<&FormElement> {
        self.form_element_groups
            .non_voided()
            .flat_map(|group| group.form_elements.non_voided())
            .find(|element| element.name == name)
    }

    /// Concepts of mandatory, non-voided elements.
    pub fn get_mandatory_concepts(&self) -> Vec<&Concept> {
        self.form_element_groups
            .non_voided()
            .flat_map(|group| group.form_elements.non_voided())
            .filter(|element| element.mandatory)
            .map(|element| &element.concept)
            .collect()
    }

    /// Orders observations as the form lays them out.
    ///
    /// Groups and their elements are taken in display order. Question-group observations have
    /// their children re-ordered by the child elements (those whose `group_uuid` is the question
    /// group element); a question group left with no children is dropped. Observations the form
    /// does not cover follow in their original order.
    pub fn order_observations(&self, observations: &[Observation]) -> Vec<Observation> {
        let mut ordered = Vec::with_capacity(observations.len());
        let mut groups: Vec<&FormElementGroup> = self.form_element_groups.iter().collect();
        groups.sort_by(|a, b| a.display_order.total_cmp(&b.display_order));
        for group in groups {
            for element in group.get_form_elements() {
                self.add_sorted_observation(element, observations, &mut ordered);
            }
        }
        let extras: Vec<Observation> = observations
            .iter()
            .filter(|obs| {
                !ordered
                    .iter()
                    .any(|placed| placed.concept_uuid() == obs.concept_uuid())
            })
            .cloned()
            .collect();
        ordered.extend(extras);
        ordered
    }

    fn order_question_group_observations(
        &self,
        observations: &[Observation],
        group_element_uuid: &str,
    ) -> Vec<Observation> {
        let mut children: Vec<&FormElement> = self
            .form_element_groups
            .iter()
            .flat_map(|group| group.form_elements.non_voided())
            .filter(|element| element.group_uuid.as_deref() == Some(group_element_uuid))
            .collect();
        children.sort_by(|a, b| a.display_order.total_cmp(&b.display_order));

        let mut ordered = Vec::new();
        for element in children {
            self.add_sorted_observation(element, observations, &mut ordered);
        }
        ordered
    }

    fn add_sorted_observation(
        &self,
        element: &FormElement,
        observations: &[Observation],
        ordered: &mut Vec<Observation>,
    ) {
        let Some(found) = observations
            .iter()
            .find(|obs| obs.concept_uuid() == element.concept.uuid.as_str())
        else {
            return;
        };
        if !element.concept.is_question_group() {
            ordered.push(found.clone());
            return;
        }

        let element_uuid = element.uuid.as_str();
        let mut sorted = found.clone_for_edit();
        match &found.value {
            ObservationValue::RepeatableQuestionGroup(repeatable) => {
                let groups: Vec<QuestionGroup> = repeatable
                    .groups()
                    .iter()
                    .map(|group| {
                        QuestionGroup::new(
                            self.order_question_group_observations(
                                &group.group_observations,
                                element_uuid,
                            ),
                        )
                    })
                    .collect();
                if groups.is_empty() {
                    return;
                }
                sorted.value =
                    ObservationValue::RepeatableQuestionGroup(RepeatableQuestionGroup::new(groups));
            }
            ObservationValue::QuestionGroup(group) => {
                let children =
                    self.order_question_group_observations(&group.group_observations, element_uuid);
                if children.is_empty() {
                    return;
                }
                sorted.value = ObservationValue::QuestionGroup(QuestionGroup::new(children));
            }
            _ => {}
        }
        ordered.push(sorted);
    }
}

/// Purges drafts made against an older version of a registration form.
///
/// Runs when an `IndividualProfile` form arrives modified after the last completed form sync.
/// Every draft whose subject type is mapped to the form is deleted.
fn purge_out_of_sync_drafts(
    ctx: &mut SyncContext<'_>,
    resource: &Resource,
    form_uuid: &EntityUuid,
) -> CoreResult<()> {
    let Some(status) = ctx.store().find_by_key(
        "entityName",
        FORM_SYNC_ENTITY_NAME,
        EntitySyncStatus::TYPE,
    ) else {
        return Ok(());
    };
    let status: EntitySyncStatus = to_entity(status)?;
    let loaded_since = status.loaded_since.unwrap_or_else(|| ctx.now());
    let Some(modified) = resource.timestamp_field("lastModifiedDateTime")? else {
        return Ok(());
    };
    if loaded_since >= modified {
        return Ok(());
    }

    let mappings: Vec<FormMapping> =
        find_all_entities(ctx.store(), &format!("form.uuid = '{form_uuid}'"))?;
    for subject_type in mappings.iter().filter_map(|m| m.subject_type.as_ref()) {
        let drafts = ctx.store().find_all_by_criteria(
            &format!("subjectType.uuid = '{subject_type}'"),
            DraftSubject::TYPE,
        )?;
        if drafts.is_empty() {
            continue;
        }
        for draft in &drafts {
            if let Some(uuid) = draft.uuid() {
                ctx.store_mut().delete_by_key(DraftSubject::TYPE, uuid)?;
            }
        }
        tracing::warn!(
            form = %form_uuid,
            subject_type = %subject_type,
            purged = drafts.len(),
            "form changed since last sync; purged out-of-sync drafts"
        );
    }
    Ok(())
}

impl FromResource for Form {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let uuid = resource.uuid()?;
        let form_type = FormType::from_wire(resource.str_field("formType"));
        if form_type == FormType::IndividualProfile {
            purge_out_of_sync_drafts(ctx, resource, &uuid)?;
        }
        Ok(Self {
            uuid,
            name: resource.string_field("name").unwrap_or_default(),
            form_type,
            form_element_groups: ChildCollection::new(),
            decision_rule: resource.string_field("decisionRule"),
            visit_schedule_rule: resource.string_field("visitScheduleRule"),
            validation_rule: resource.string_field("validationRule"),
            checklists_rule: resource.string_field("checklistsRule"),
            task_schedule_rule: resource.string_field("taskScheduleRule"),
        })
    }
}

impl ToResource for Form {
    fn to_resource(&self) -> Resource {
        let mut resource = Resource::new();
        resource
            .insert("uuid", self.uuid.as_str())
            .insert("name", self.name.as_str())
            .insert("formType", self.form_type.as_str())
            .insert_opt("decisionRule", self.decision_rule.clone())
            .insert_opt("visitScheduleRule", self.visit_schedule_rule.clone())
            .insert_opt("validationRule", self.validation_rule.clone())
            .insert_opt("checklistsRule", self.checklists_rule.clone())
            .insert_opt("taskScheduleRule", self.task_schedule_rule.clone());
        resource
    }
}

// ============================================================================
// Element groups and elements
// ============================================================================

/// One page of a form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormElementGroup {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub display_order: f64,
    #[serde(default)]
    pub display: Option<String>,
    pub form: EntityRef<Form>,
    #[serde(default)]
    pub form_elements: ChildCollection<FormElement>,
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(FormElementGroup, EntityType::FormElementGroup);

impl ParentEntity for FormElementGroup {}

impl FormElementGroup {
    pub fn add_form_element(&mut self, element: FormElement) -> bool {
        self.form_elements.insert_if_absent(element)
    }

    /// Non-voided elements in display order.
    pub fn get_form_elements(&self) -> Vec<&FormElement> {
        let mut elements: Vec<&FormElement> = self.form_elements.non_voided().collect();
        elements.sort_by(|a, b| a.display_order.total_cmp(&b.display_order));
        elements
    }

    pub fn form_element_ids(&self) -> Vec<&str> {
        self.get_form_elements()
            .into_iter()
            .map(|element| element.uuid.as_str())
            .collect()
    }

    /// Validates each element against the matching observation.
    ///
    /// Elements inside a question group are checked against the group's children; a repeatable
    /// group has its children checked once per answered group.
    pub fn validate(&self, observations: &[Observation]) -> Vec<ValidationResult> {
        let elements = self.get_form_elements();
        let mut results = Vec::new();
        for element in elements.iter().filter(|e| e.group_uuid.is_none()) {
            let observation = observations
                .iter()
                .find(|obs| obs.concept_uuid() == element.concept.uuid.as_str());
            if !element.concept.is_question_group() {
                results.push(element.validate(observation.map(Observation::get_value).as_ref()));
                continue;
            }
            let children: Vec<&&FormElement> = elements
                .iter()
                .filter(|e| e.group_uuid.as_deref() == Some(element.uuid.as_str()))
                .collect();
            let groups: Vec<&QuestionGroup> = match observation.map(|obs| &obs.value) {
                Some(ObservationValue::RepeatableQuestionGroup(repeatable)) => {
                    repeatable.groups().iter().collect()
                }
                Some(ObservationValue::QuestionGroup(group)) => vec![group],
                _ => Vec::new(),
            };
            if groups.is_empty() {
                let empty = QuestionGroup::default();
                results.extend(children.iter().map(|child| validate_in_group(child, &empty)));
            }
            for group in groups {
                results.extend(children.iter().map(|child| validate_in_group(child, group)));
            }
        }
        results
    }
}

fn validate_in_group(element: &FormElement, group: &QuestionGroup) -> ValidationResult {
    element.validate(
        group
            .get_observation_value(element.concept.uuid.as_str())
            .as_ref(),
    )
}

impl FromResource for FormElementGroup {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            display_order: resource.f64_field("displayOrder").unwrap_or_default(),
            display: resource.string_field("display"),
            form: ctx.parent_ref(EntityType::FormElementGroup, resource, "formUUID")?,
            form_elements: ChildCollection::new(),
            rule: resource.string_field("rule"),
            voided: resource.voided(),
        })
    }
}

impl ToResource for FormElementGroup {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("name", self.name.as_str())
            .insert("displayOrder", self.display_order)
            .insert_opt("display", self.display.clone())
            .insert("formUUID", self.form.as_str())
            .insert_opt("rule", self.rule.clone());
        resource
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormElement {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub display_order: f64,
    #[serde(default)]
    pub mandatory: bool,
    pub concept: Concept,
    pub form_element_group: EntityRef<FormElementGroup>,
    /// Uuid of the question-group element this element belongs to.
    #[serde(default)]
    pub group_uuid: Option<String>,
    #[serde(default)]
    pub key_values: Vec<KeyValue>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(FormElement, EntityType::FormElement);

impl FormElement {
    pub fn is_repeatable(&self) -> bool {
        self.key_values
            .iter()
            .any(|kv| kv.key == "repeatable" && kv.value == Value::Bool(true))
    }

    /// Fails a mandatory element with no value.
    pub fn validate(&self, value: Option<&Value>) -> ValidationResult {
        let empty = match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(Value::Object(map)) => map.is_empty(),
            Some(_) => false,
        };
        if self.mandatory && empty {
            ValidationResult::failure(self.uuid.as_str(), EMPTY_VALIDATION_MESSAGE)
        } else {
            ValidationResult::successful(self.uuid.as_str())
        }
    }
}

impl FromResource for FormElement {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let concept: Concept = ctx.parent(EntityType::FormElement, resource, "conceptUUID")?;
        let key_values = match resource.get("keyValues") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let key = item.get("key")?.as_str()?;
                    Some(KeyValue::new(key, item.get("value").cloned().unwrap_or(Value::Null)))
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            display_order: resource.f64_field("displayOrder").unwrap_or_default(),
            mandatory: resource.bool_field("mandatory").unwrap_or(false),
            concept: concept.clone_for_reference(),
            form_element_group: ctx.parent_ref(
                EntityType::FormElement,
                resource,
                "formElementGroupUUID",
            )?,
            group_uuid: resource.uuid_for("groupUUID").map(|uuid| uuid.to_string()),
            key_values,
            voided: resource.voided(),
        })
    }
}

impl ToResource for FormElement {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("name", self.name.as_str())
            .insert("displayOrder", self.display_order)
            .insert("mandatory", self.mandatory)
            .insert("conceptUUID", self.concept.uuid.as_str())
            .insert("formElementGroupUUID", self.form_element_group.as_str())
            .insert_opt("groupUUID", self.group_uuid.clone());
        resource
    }
}

// ============================================================================
// Form mapping
// ============================================================================

/// Binds a form to the subject type (and optionally program or encounter type) it captures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMapping {
    pub uuid: EntityUuid,
    pub form: EntityRef<Form>,
    #[serde(default)]
    pub subject_type: Option<EntityRef<SubjectType>>,
    #[serde(rename = "entityUUID", default)]
    pub entity_uuid: Option<String>,
    #[serde(rename = "observationsTypeEntityUUID", default)]
    pub observations_type_entity_uuid: Option<String>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(FormMapping, EntityType::FormMapping);

impl FromResource for FormMapping {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            form: ctx.parent_ref(EntityType::FormMapping, resource, "formUUID")?,
            subject_type: ctx.optional_parent_ref(resource, "subjectTypeUUID"),
            entity_uuid: resource.uuid_for("entityUUID").map(|u| u.to_string()),
            observations_type_entity_uuid: resource
                .uuid_for("observationsTypeEntityUUID")
                .map(|u| u.to_string()),
            voided: resource.voided(),
        })
    }
}

impl ToResource for FormMapping {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("formUUID", self.form.as_str())
            .insert_opt(
                "subjectTypeUUID",
                self.subject_type.as_ref().map(|st| st.as_str().to_owned()),
            )
            .insert_opt("entityUUID", self.entity_uuid.clone())
            .insert_opt(
                "observationsTypeEntityUUID",
                self.observations_type_entity_uuid.clone(),
            );
        resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::mapper::save_entity;
    use crate::observation::PrimitiveValue;
    use crate::store::{EntityStore, InMemoryStore, Record, UpdateMode};
    use crate::CoreError;
    use fieldcare_types::ConceptDataType;
    use fieldcare_wire::ResourcePage;
    use serde_json::json;

    fn uuid(s: &str) -> EntityUuid {
        EntityUuid::from_wire(s).expect("uuid")
    }

    fn concept(id: &str, datatype: ConceptDataType) -> Concept {
        Concept::create(id, datatype, Vec::new(), uuid(id))
    }

    fn element(id: &str, order: f64, concept: Concept, group_uuid: Option<&str>) -> FormElement {
        FormElement {
            uuid: uuid(id),
            name: id.to_owned(),
            display_order: order,
            mandatory: false,
            concept,
            form_element_group: EntityRef::new(uuid("feg")),
            group_uuid: group_uuid.map(str::to_owned),
            key_values: Vec::new(),
            voided: false,
        }
    }

    fn group(id: &str, order: f64, elements: Vec<FormElement>) -> FormElementGroup {
        FormElementGroup {
            uuid: uuid(id),
            name: id.to_owned(),
            display_order: order,
            display: None,
            form: EntityRef::new(uuid("f1")),
            form_elements: elements.into_iter().collect(),
            rule: None,
            voided: false,
        }
    }

    fn text_obs(concept: &Concept, value: &str) -> Observation {
        Observation::new(
            concept.clone(),
            ObservationValue::Primitive(PrimitiveValue::new(json!(value), concept.datatype)),
        )
    }

    fn concept_uuids(observations: &[Observation]) -> Vec<&str> {
        observations.iter().map(Observation::concept_uuid).collect()
    }

    #[test]
    fn orders_by_group_then_element_and_appends_extras() {
        let (a, b, c, extra) = (
            concept("a", ConceptDataType::Text),
            concept("b", ConceptDataType::Text),
            concept("c", ConceptDataType::Text),
            concept("x", ConceptDataType::Text),
        );
        let mut form = Form::create("Registration", FormType::IndividualProfile);
        form.add_form_element_group(group("g2", 2.0, vec![element("e3", 1.0, c.clone(), None)]));
        form.add_form_element_group(group(
            "g1",
            1.0,
            vec![
                element("e2", 2.0, b.clone(), None),
                element("e1", 1.0, a.clone(), None),
            ],
        ));

        let observations = vec![
            text_obs(&extra, "x"),
            text_obs(&c, "c"),
            text_obs(&a, "a"),
            text_obs(&b, "b"),
        ];
        let ordered = form.order_observations(&observations);

        assert_eq!(concept_uuids(&ordered), ["a", "b", "c", "x"]);
        assert_eq!(observations.len(), 4);
    }

    #[test]
    fn reorders_question_group_children() {
        let qg = concept("qg", ConceptDataType::QuestionGroup);
        let (w, h) = (
            concept("w", ConceptDataType::Numeric),
            concept("h", ConceptDataType::Numeric),
        );
        let mut form = Form::create("Vitals", FormType::Encounter);
        form.add_form_element_group(group(
            "g1",
            1.0,
            vec![
                element("qe", 1.0, qg.clone(), None),
                element("he", 2.0, h.clone(), Some("qe")),
                element("we", 3.0, w.clone(), Some("qe")),
            ],
        ));

        let observations = vec![Observation::new(
            qg.clone(),
            ObservationValue::QuestionGroup(QuestionGroup::new(vec![
                text_obs(&w, "60"),
                text_obs(&h, "170"),
            ])),
        )];
        let ordered = form.order_observations(&observations);

        assert_eq!(ordered.len(), 1);
        match &ordered[0].value {
            ObservationValue::QuestionGroup(group) => {
                assert_eq!(concept_uuids(&group.group_observations), ["h", "w"])
            }
            other => panic!("expected QuestionGroup, got {other:?}"),
        }
        // the source is untouched
        match &observations[0].value {
            ObservationValue::QuestionGroup(group) => {
                assert_eq!(concept_uuids(&group.group_observations), ["w", "h"])
            }
            other => panic!("expected QuestionGroup, got {other:?}"),
        }
    }

    #[test]
    fn mandatory_element_validation() {
        let mut e = element("e1", 1.0, concept("a", ConceptDataType::Text), None);
        assert!(e.validate(None).success);

        e.mandatory = true;
        let failed = e.validate(Some(&json!("  ")));
        assert!(!failed.success);
        assert_eq!(failed.message_key.as_deref(), Some(EMPTY_VALIDATION_MESSAGE));
        assert!(e.validate(Some(&json!("x"))).success);
    }

    #[test]
    fn group_validation_checks_question_group_children() {
        let qg = concept("qg", ConceptDataType::QuestionGroup);
        let w = concept("w", ConceptDataType::Numeric);
        let mut child = element("we", 2.0, w.clone(), Some("qe"));
        child.mandatory = true;
        let page = group("g1", 1.0, vec![element("qe", 1.0, qg.clone(), None), child]);

        let results = page.validate(&[]);
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);

        let answered = vec![Observation::new(
            qg,
            ObservationValue::QuestionGroup(QuestionGroup::new(vec![text_obs(&w, "60")])),
        )];
        assert!(page.validate(&answered).iter().all(|r| r.success));
    }

    fn seed(store: &mut InMemoryStore, entity_type: EntityType, value: Value) {
        store
            .create(
                entity_type,
                Record::from_value(value).expect("record"),
                UpdateMode::All,
            )
            .expect("seed");
    }

    fn seeded_store(loaded_since: &str) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        seed(
            &mut store,
            EntityType::EntitySyncStatus,
            json!({"uuid": "s1", "entityName": "Form", "loadedSince": loaded_since}),
        );
        seed(
            &mut store,
            EntityType::FormMapping,
            json!({"uuid": "m1", "form": {"uuid": "f1"}, "subjectType": {"uuid": "st1"}}),
        );
        for (draft, st) in [("d1", "st1"), ("d2", "st2")] {
            seed(
                &mut store,
                EntityType::DraftSubject,
                json!({"uuid": draft, "subjectType": {"uuid": st}}),
            );
        }
        store
    }

    fn apply_form(store: &mut InMemoryStore, last_modified: &str) -> Form {
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(store, &page, &config);
        let resource = Resource::from_value(json!({
            "uuid": "f1", "name": "Registration", "formType": "IndividualProfile",
            "lastModifiedDateTime": last_modified
        }))
        .expect("resource");
        Form::from_resource(&resource, &mut ctx).expect("built")
    }

    #[test]
    fn newer_profile_form_purges_mapped_drafts() {
        let mut store = seeded_store("2024-01-01T00:00:00.000Z");

        let form = apply_form(&mut store, "2024-02-01T00:00:00.000Z");

        assert_eq!(form.form_type, FormType::IndividualProfile);
        assert!(store
            .find_by_key("uuid", "d1", EntityType::DraftSubject)
            .is_none());
        assert!(store
            .find_by_key("uuid", "d2", EntityType::DraftSubject)
            .is_some());
    }

    #[test]
    fn older_profile_form_keeps_drafts() {
        let mut store = seeded_store("2024-03-01T00:00:00.000Z");

        apply_form(&mut store, "2024-02-01T00:00:00.000Z");

        assert_eq!(store.count(EntityType::DraftSubject), 2);
    }

    #[test]
    fn form_mapping_requires_form() {
        let mut store = InMemoryStore::new();
        let subject_type = SubjectType::create("Person", crate::entities::SubjectTypeKind::Person);
        save_entity(&mut store, &subject_type, UpdateMode::All).expect("seed");
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(&mut store, &page, &config);

        let resource = Resource::from_value(json!({
            "uuid": "m1", "formUUID": "f9", "subjectTypeUUID": subject_type.uuid.as_str()
        }))
        .expect("resource");
        match FormMapping::from_resource(&resource, &mut ctx) {
            Err(CoreError::Association(err)) => {
                assert_eq!(err.code(), "FormMapping-Form-Association");
                assert_eq!(err.parent_uuid.as_deref(), Some("f9"));
            }
            other => panic!("expected Association, got {other:?}"),
        }
    }
}
