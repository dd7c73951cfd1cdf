use super::{base_resource, Checklist, Individual, Program};
use crate::association::ParentEntity;
use crate::collection::ChildCollection;
use crate::entity_ref::EntityRef;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::merge::merge_child;
use crate::observation::{build_observations, find_observation, observations_to_resource, Observation};
use crate::CoreResult;
use chrono::{DateTime, Utc};
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::{format_iso_timestamp, Resource};
use serde::{Deserialize, Serialize};

/// A subject's enrolment in a program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramEnrolment {
    pub uuid: EntityUuid,
    pub program: Program,
    pub enrolment_date_time: DateTime<Utc>,
    #[serde(default)]
    pub program_exit_date_time: Option<DateTime<Utc>>,
    pub individual: EntityRef<Individual>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub program_exit_observations: Vec<Observation>,
    #[serde(default)]
    pub checklists: ChildCollection<Checklist>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(ProgramEnrolment, EntityType::ProgramEnrolment);

impl ParentEntity for ProgramEnrolment {}

impl ProgramEnrolment {
    pub fn create(
        individual: EntityRef<Individual>,
        program: Program,
        enrolment_date_time: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: EntityUuid::new(),
            program,
            enrolment_date_time,
            program_exit_date_time: None,
            individual,
            observations: Vec::new(),
            program_exit_observations: Vec::new(),
            checklists: ChildCollection::new(),
            voided: false,
        }
    }

    /// Enrolled and not yet exited.
    pub fn is_active(&self) -> bool {
        !self.voided && self.program_exit_date_time.is_none()
    }

    pub fn find_observation(&self, concept_uuid: &str) -> Option<&Observation> {
        find_observation(&self.observations, concept_uuid)
    }

    pub fn find_exit_observation(&self, concept_uuid: &str) -> Option<&Observation> {
        find_observation(&self.program_exit_observations, concept_uuid)
    }

    pub fn add_checklist(&mut self, checklist: Checklist) -> bool {
        merge_child(&mut self.checklists, checklist)
    }
}

impl FromResource for ProgramEnrolment {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let uuid = resource.uuid()?;
        let individual = ctx.parent_ref(EntityType::ProgramEnrolment, resource, "individualUUID")?;
        let program = ctx.parent(EntityType::ProgramEnrolment, resource, "programUUID")?;
        let observations = build_observations(
            ctx.store(),
            EntityType::ProgramEnrolment,
            uuid.as_str(),
            resource.get("observations"),
        )?;
        let program_exit_observations = build_observations(
            ctx.store(),
            EntityType::ProgramEnrolment,
            uuid.as_str(),
            resource.get("programExitObservations"),
        )?;
        Ok(Self {
            program,
            enrolment_date_time: resource.required_timestamp("enrolmentDateTime")?,
            program_exit_date_time: resource.timestamp_field("programExitDateTime")?,
            individual,
            observations,
            program_exit_observations,
            checklists: ChildCollection::new(),
            voided: resource.voided(),
            uuid,
        })
    }
}

impl ToResource for ProgramEnrolment {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("programUUID", self.program.uuid.as_str())
            .insert("individualUUID", self.individual.as_str())
            .insert(
                "enrolmentDateTime",
                format_iso_timestamp(self.enrolment_date_time),
            )
            .insert_opt(
                "programExitDateTime",
                self.program_exit_date_time.map(format_iso_timestamp),
            )
            .insert("observations", observations_to_resource(&self.observations))
            .insert(
                "programExitObservations",
                observations_to_resource(&self.program_exit_observations),
            );
        resource
    }
}
