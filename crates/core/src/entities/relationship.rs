//! Links between subjects.

use super::{base_resource, Individual};
use crate::association::resolve_group_association;
use crate::entity_ref::EntityRef;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::{format_iso_timestamp, Resource};
use serde::{Deserialize, Serialize};

/// A relationship from individual A to individual B.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualRelationship {
    pub uuid: EntityUuid,
    pub individual_a: EntityRef<Individual>,
    pub individual_b: EntityRef<Individual>,
    #[serde(default)]
    pub relationship_type_uuid: Option<String>,
    #[serde(default)]
    pub enter_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(IndividualRelationship, EntityType::IndividualRelationship);

impl FromResource for IndividualRelationship {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let child_type = EntityType::IndividualRelationship;
        Ok(Self {
            uuid: resource.uuid()?,
            individual_a: ctx.parent_ref(child_type, resource, "individualAUUID")?,
            individual_b: ctx.parent_ref(child_type, resource, "individualBUUID")?,
            relationship_type_uuid: resource
                .uuid_for("relationshipTypeUUID")
                .map(|uuid| uuid.to_string()),
            enter_date_time: resource.timestamp_field("enterDateTime")?,
            exit_date_time: resource.timestamp_field("exitDateTime")?,
            voided: resource.voided(),
        })
    }
}

impl ToResource for IndividualRelationship {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("individualAUUID", self.individual_a.as_str())
            .insert("individualBUUID", self.individual_b.as_str())
            .insert_opt("relationshipTypeUUID", self.relationship_type_uuid.clone())
            .insert_opt("enterDateTime", self.enter_date_time.map(format_iso_timestamp))
            .insert_opt("exitDateTime", self.exit_date_time.map(format_iso_timestamp));
        resource
    }
}

/// Membership of a member subject in a group subject.
///
/// Joins both the group's `groupSubjects` and the member's `groups`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSubject {
    pub uuid: EntityUuid,
    pub group_subject: EntityRef<Individual>,
    /// Absent only on a voided membership whose member is gone.
    #[serde(default)]
    pub member_subject: Option<EntityRef<Individual>>,
    #[serde(default)]
    pub group_role_uuid: Option<String>,
    #[serde(default)]
    pub membership_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub membership_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(GroupSubject, EntityType::GroupSubject);

impl GroupSubject {
    pub fn is_active(&self) -> bool {
        !self.voided && self.membership_end_date.is_none()
    }
}

impl FromResource for GroupSubject {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let parents = resolve_group_association(
            ctx.store(),
            EntityType::GroupSubject,
            resource,
            "groupSubjectUUID",
            "memberSubjectUUID",
            EntityType::Individual,
        )?;
        let group_subject = resource
            .uuid_for("groupSubjectUUID")
            .map(EntityRef::new)
            .ok_or_else(|| CoreError::InvalidInput("groupSubjectUUID vanished".into()))?;
        let member_subject = parents
            .member
            .and_then(|_| resource.uuid_for("memberSubjectUUID"))
            .map(EntityRef::new);
        Ok(Self {
            uuid: resource.uuid()?,
            group_subject,
            member_subject,
            group_role_uuid: resource.uuid_for("groupRoleUUID").map(|uuid| uuid.to_string()),
            membership_start_date: resource.timestamp_field("membershipStartDate")?,
            membership_end_date: resource.timestamp_field("membershipEndDate")?,
            voided: resource.voided(),
        })
    }
}

impl ToResource for GroupSubject {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("groupSubjectUUID", self.group_subject.as_str())
            .insert_opt(
                "memberSubjectUUID",
                self.member_subject.as_ref().map(|member| member.to_string()),
            )
            .insert_opt("groupRoleUUID", self.group_role_uuid.clone())
            .insert_opt(
                "membershipStartDate",
                self.membership_start_date.map(format_iso_timestamp),
            )
            .insert_opt(
                "membershipEndDate",
                self.membership_end_date.map(format_iso_timestamp),
            );
        resource
    }
}
