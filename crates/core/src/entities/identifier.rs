use super::{base_resource, IdentifierSource, Individual, ProgramEnrolment};
use crate::entity_ref::EntityRef;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::CoreResult;
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::Resource;
use serde::{Deserialize, Serialize};

/// An identifier handed out from a source, possibly already used by a subject or enrolment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierAssignment {
    pub uuid: EntityUuid,
    pub identifier_source: IdentifierSource,
    pub identifier: String,
    #[serde(default)]
    pub assignment_order: f64,
    #[serde(default)]
    pub individual: Option<EntityRef<Individual>>,
    #[serde(default)]
    pub program_enrolment: Option<EntityRef<ProgramEnrolment>>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(IdentifierAssignment, EntityType::IdentifierAssignment);

impl IdentifierAssignment {
    /// Not yet given to a subject or enrolment.
    pub fn is_unassigned(&self) -> bool {
        self.individual.is_none() && self.program_enrolment.is_none()
    }
}

impl FromResource for IdentifierAssignment {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            identifier_source: ctx.parent(
                EntityType::IdentifierAssignment,
                resource,
                "identifierSourceUUID",
            )?,
            identifier: resource.required_str("identifier")?.to_owned(),
            assignment_order: resource.f64_field("assignmentOrder").unwrap_or_default(),
            individual: ctx.optional_parent_ref(resource, "individualUUID"),
            program_enrolment: ctx.optional_parent_ref(resource, "programEnrolmentUUID"),
            voided: resource.voided(),
        })
    }
}

impl ToResource for IdentifierAssignment {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("identifierSourceUUID", self.identifier_source.uuid.as_str())
            .insert("identifier", self.identifier.as_str())
            .insert("assignmentOrder", self.assignment_order)
            .insert(
                "individualUUID",
                self.individual.as_ref().map(EntityRef::to_string),
            )
            .insert(
                "programEnrolmentUUID",
                self.program_enrolment.as_ref().map(EntityRef::to_string),
            );
        resource
    }
}
