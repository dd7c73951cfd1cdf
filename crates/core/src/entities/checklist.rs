//! Checklists: configured item details and the per-enrolment checklists built from them.
//!
//! An item detail may depend on a lead item detail. The lead is normally already in the store;
//! when the server delivers it later in the same page it is built in place, following the chain
//! of leads up to the configured forward-reference depth.

use super::{base_resource, Concept, Form, ProgramEnrolment};
use crate::association::ParentEntity;
use crate::collection::ChildCollection;
use crate::entity_ref::EntityRef;
use crate::error::AssociationError;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::mapper::find_entity;
use crate::merge::merge_child;
use crate::observation::{build_observations, observations_to_resource, Observation};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::{format_iso_date, format_iso_timestamp, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One state an item passes through, as a window of days from the checklist's base date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemStatus {
    pub state: String,
    #[serde(rename = "color", default)]
    pub colour: Option<String>,
    #[serde(default)]
    pub display_order: f64,
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
}

impl ChecklistItemStatus {
    /// Whether `day` (days since the base date) falls inside this state's window.
    pub fn covers(&self, day: i64) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDetail {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub items: ChildCollection<ChecklistItemDetail>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(ChecklistDetail, EntityType::ChecklistDetail);

impl ParentEntity for ChecklistDetail {}

impl ChecklistDetail {
    pub fn add_item(&mut self, item: ChecklistItemDetail) -> bool {
        merge_child(&mut self.items, item)
    }
}

impl FromResource for ChecklistDetail {
    fn from_resource(resource: &Resource, _ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            items: ChildCollection::new(),
            voided: resource.voided(),
        })
    }
}

impl ToResource for ChecklistDetail {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource.insert("name", self.name.as_str());
        resource
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemDetail {
    pub uuid: EntityUuid,
    pub concept: Concept,
    #[serde(default)]
    pub state_config: Vec<ChecklistItemStatus>,
    #[serde(default)]
    pub form: Option<EntityRef<Form>>,
    pub checklist_detail: EntityRef<ChecklistDetail>,
    /// The lead item this one follows.
    #[serde(default)]
    pub dependent_on: Option<Box<ChecklistItemDetail>>,
    #[serde(default)]
    pub schedule_on_expiry_of_dependency: bool,
    #[serde(default)]
    pub min_days_from_start_date: Option<i64>,
    #[serde(default)]
    pub min_days_from_dependent: Option<i64>,
    #[serde(default)]
    pub expires_after: Option<i64>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(ChecklistItemDetail, EntityType::ChecklistItemDetail);

impl ChecklistItemDetail {
    pub fn is_dependent(&self) -> bool {
        self.dependent_on.is_some()
    }

    /// The configured state covering `day` days after the base date.
    pub fn state_on(&self, day: i64) -> Option<&ChecklistItemStatus> {
        self.state_config.iter().find(|status| status.covers(day))
    }

    fn resolve_lead(
        resource: &Resource,
        lead_uuid: &EntityUuid,
        ctx: &mut SyncContext<'_>,
    ) -> CoreResult<Self> {
        if let Some(lead) = find_entity::<Self>(ctx.store(), lead_uuid.as_str())? {
            return Ok(lead);
        }
        let Some(lead_resource) = ctx.page().find_by_uuid(lead_uuid.as_str()).cloned() else {
            return Err(AssociationError::new(
                EntityType::ChecklistItemDetail,
                EntityType::ChecklistItemDetail,
                resource.uuid_str().unwrap_or_default(),
                Some(lead_uuid.to_string()),
            )
            .into());
        };
        tracing::debug!(lead = %lead_uuid, "building lead checklist item detail from current page");
        ctx.follow_forward_reference(EntityType::ChecklistItemDetail, lead_uuid.as_str(), |ctx| {
            Self::from_resource(&lead_resource, ctx)
        })
    }
}

impl FromResource for ChecklistItemDetail {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let child_type = EntityType::ChecklistItemDetail;
        let concept: Concept = ctx.parent(child_type, resource, "conceptUUID")?;
        let state_config = match resource.get("checklistItemStatus") {
            None => Vec::new(),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|source| {
                CoreError::Serialization {
                    entity_type: child_type,
                    source,
                }
            })?,
        };
        let dependent_on = match resource.uuid_for("leadDetailUUID") {
            Some(lead_uuid) => Some(Box::new(Self::resolve_lead(resource, &lead_uuid, ctx)?)),
            None => None,
        };
        Ok(Self {
            uuid: resource.uuid()?,
            concept: concept.clone_for_reference(),
            state_config,
            form: ctx.optional_parent_ref(resource, "formUUID"),
            checklist_detail: ctx.parent_ref(child_type, resource, "checklistDetailUUID")?,
            dependent_on,
            schedule_on_expiry_of_dependency: resource
                .bool_field("scheduleOnExpiryOfDependency")
                .unwrap_or(false),
            min_days_from_start_date: resource.i64_field("minDaysFromStartDate"),
            min_days_from_dependent: resource.i64_field("minDaysFromDependent"),
            expires_after: resource.i64_field("expiresAfter"),
            voided: resource.voided(),
        })
    }
}

impl ToResource for ChecklistItemDetail {
    fn to_resource(&self) -> Resource {
        let state_config = serde_json::to_value(&self.state_config).unwrap_or(Value::Null);
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("conceptUUID", self.concept.uuid.as_str())
            .insert("checklistDetailUUID", self.checklist_detail.as_str())
            .insert_opt("formUUID", self.form.as_ref().map(EntityRef::to_string))
            .insert_opt(
                "leadDetailUUID",
                self.dependent_on.as_ref().map(|lead| lead.uuid.to_string()),
            )
            .insert("checklistItemStatus", state_config)
            .insert("scheduleOnExpiryOfDependency", self.schedule_on_expiry_of_dependency)
            .insert_opt("minDaysFromStartDate", self.min_days_from_start_date)
            .insert_opt("minDaysFromDependent", self.min_days_from_dependent)
            .insert_opt("expiresAfter", self.expires_after);
        resource
    }
}

/// A checklist instantiated for one enrolment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub uuid: EntityUuid,
    pub detail: EntityRef<ChecklistDetail>,
    pub base_date: NaiveDate,
    #[serde(default)]
    pub items: ChildCollection<ChecklistItem>,
    pub program_enrolment: EntityRef<ProgramEnrolment>,
}

impl_entity!(Checklist, EntityType::Checklist, unvoidable);

impl ParentEntity for Checklist {}

impl Checklist {
    pub fn create(
        program_enrolment: EntityRef<ProgramEnrolment>,
        detail: EntityRef<ChecklistDetail>,
        base_date: NaiveDate,
    ) -> Self {
        Self {
            uuid: EntityUuid::new(),
            detail,
            base_date,
            items: ChildCollection::new(),
            program_enrolment,
        }
    }

    pub fn add_item(&mut self, item: ChecklistItem) -> bool {
        merge_child(&mut self.items, item)
    }

    /// Finds an item by its concept's name.
    pub fn item_named(&self, item_name: &str) -> Option<&ChecklistItem> {
        self.items
            .iter()
            .find(|item| item.detail.concept.name == item_name)
    }

    /// Records (or clears) the completion date of the item named `item_name`. Returns whether
    /// such an item exists.
    pub fn set_completion_date(
        &mut self,
        item_name: &str,
        completion_date: Option<DateTime<Utc>>,
    ) -> bool {
        let Some(uuid) = self.item_named(item_name).map(|item| item.uuid.to_string()) else {
            return false;
        };
        match self.items.get_mut(&uuid) {
            Some(item) => {
                item.completion_date = completion_date;
                true
            }
            None => false,
        }
    }
}

impl FromResource for Checklist {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let child_type = EntityType::Checklist;
        Ok(Self {
            uuid: resource.uuid()?,
            detail: ctx.parent_ref(child_type, resource, "checklistDetailUUID")?,
            base_date: resource.required_date("baseDate")?,
            items: ChildCollection::new(),
            program_enrolment: ctx.parent_ref(child_type, resource, "programEnrolmentUUID")?,
        })
    }
}

impl ToResource for Checklist {
    fn to_resource(&self) -> Resource {
        let mut resource = Resource::new();
        resource
            .insert("uuid", self.uuid.as_str())
            .insert("baseDate", format_iso_date(self.base_date))
            .insert("programEnrolmentUUID", self.program_enrolment.as_str())
            .insert("checklistDetailUUID", self.detail.as_str());
        resource
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub uuid: EntityUuid,
    pub detail: ChecklistItemDetail,
    pub checklist: EntityRef<Checklist>,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(ChecklistItem, EntityType::ChecklistItem);

impl ChecklistItem {
    pub fn is_completed(&self) -> bool {
        self.completion_date.is_some()
    }
}

impl FromResource for ChecklistItem {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let child_type = EntityType::ChecklistItem;
        let uuid = resource.uuid()?;
        let detail = ctx.parent(child_type, resource, "checklistItemDetailUUID")?;
        let observations = build_observations(
            ctx.store(),
            child_type,
            uuid.as_str(),
            resource.get("observations"),
        )?;
        Ok(Self {
            detail,
            checklist: ctx.parent_ref(child_type, resource, "checklistUUID")?,
            completion_date: resource.timestamp_field("completionDate")?,
            observations,
            voided: resource.voided(),
            uuid,
        })
    }
}

impl ToResource for ChecklistItem {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("checklistItemDetailUUID", self.detail.uuid.as_str())
            .insert("checklistUUID", self.checklist.as_str())
            .insert_opt("completionDate", self.completion_date.map(format_iso_timestamp))
            .insert("observations", observations_to_resource(&self.observations));
        resource
    }
}
