use super::{base_resource, EncounterType, Individual};
use crate::entity_ref::EntityRef;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::observation::{build_observations, find_observation, observations_to_resource, Observation};
use crate::CoreResult;
use chrono::{DateTime, Utc};
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::{format_iso_timestamp, Resource};
use serde::{Deserialize, Serialize};

/// A visit to a subject, completed, scheduled or cancelled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub uuid: EntityUuid,
    pub encounter_type: EncounterType,
    pub individual: EntityRef<Individual>,
    #[serde(default)]
    pub encounter_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub earliest_visit_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_visit_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub cancel_observations: Vec<Observation>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(Encounter, EntityType::Encounter);

impl Encounter {
    /// Planned but neither done nor cancelled.
    pub fn is_scheduled(&self) -> bool {
        self.earliest_visit_date_time.is_some()
            && self.encounter_date_time.is_none()
            && self.cancel_date_time.is_none()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_date_time.is_some()
    }

    pub fn find_observation(&self, concept_uuid: &str) -> Option<&Observation> {
        find_observation(&self.observations, concept_uuid)
    }
}

impl FromResource for Encounter {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let uuid = resource.uuid()?;
        let individual = ctx.parent_ref(EntityType::Encounter, resource, "individualUUID")?;
        let encounter_type = ctx.parent(EntityType::Encounter, resource, "encounterTypeUUID")?;
        let observations = build_observations(
            ctx.store(),
            EntityType::Encounter,
            uuid.as_str(),
            resource.get("observations"),
        )?;
        let cancel_observations = build_observations(
            ctx.store(),
            EntityType::Encounter,
            uuid.as_str(),
            resource.get("cancelObservations"),
        )?;
        Ok(Self {
            encounter_type,
            individual,
            encounter_date_time: resource.timestamp_field("encounterDateTime")?,
            earliest_visit_date_time: resource.timestamp_field("earliestVisitDateTime")?,
            max_visit_date_time: resource.timestamp_field("maxVisitDateTime")?,
            cancel_date_time: resource.timestamp_field("cancelDateTime")?,
            name: resource.string_field("name"),
            observations,
            cancel_observations,
            voided: resource.voided(),
            uuid,
        })
    }
}

impl ToResource for Encounter {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("encounterTypeUUID", self.encounter_type.uuid.as_str())
            .insert("individualUUID", self.individual.as_str())
            .insert_opt(
                "encounterDateTime",
                self.encounter_date_time.map(format_iso_timestamp),
            )
            .insert_opt(
                "earliestVisitDateTime",
                self.earliest_visit_date_time.map(format_iso_timestamp),
            )
            .insert_opt(
                "maxVisitDateTime",
                self.max_visit_date_time.map(format_iso_timestamp),
            )
            .insert_opt(
                "cancelDateTime",
                self.cancel_date_time.map(format_iso_timestamp),
            )
            .insert_opt("name", self.name.clone())
            .insert("observations", observations_to_resource(&self.observations))
            .insert(
                "cancelObservations",
                observations_to_resource(&self.cancel_observations),
            );
        resource
    }
}
