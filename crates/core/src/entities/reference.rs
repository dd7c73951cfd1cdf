//! Reference data: small lookup entities embedded by value into the records that use them.

use super::base_resource;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::CoreResult;
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::Resource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gender {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(Gender, EntityType::Gender);

impl Gender {
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            uuid: EntityUuid::new(),
            name: name.into(),
            voided: false,
        }
    }
}

impl FromResource for Gender {
    fn from_resource(resource: &Resource, _ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            voided: resource.voided(),
        })
    }
}

impl ToResource for Gender {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource.insert("name", self.name.as_str());
        resource
    }
}

/// Kind of subject a subject type registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectTypeKind {
    Person,
    #[default]
    Individual,
    Household,
    Group,
}

impl SubjectTypeKind {
    fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("Person") => SubjectTypeKind::Person,
            Some("Household") => SubjectTypeKind::Household,
            Some("Group") => SubjectTypeKind::Group,
            Some("Individual") | None => SubjectTypeKind::Individual,
            Some(other) => {
                tracing::warn!(kind = other, "unknown subject type kind; using Individual");
                SubjectTypeKind::Individual
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubjectTypeKind::Person => "Person",
            SubjectTypeKind::Individual => "Individual",
            SubjectTypeKind::Household => "Household",
            SubjectTypeKind::Group => "Group",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectType {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: SubjectTypeKind,
    #[serde(default)]
    pub allow_empty_location: bool,
    #[serde(default)]
    pub unique_name: bool,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(SubjectType, EntityType::SubjectType);

impl SubjectType {
    pub fn create(name: impl Into<String>, kind: SubjectTypeKind) -> Self {
        Self {
            uuid: EntityUuid::new(),
            name: name.into(),
            kind,
            allow_empty_location: false,
            unique_name: false,
            voided: false,
        }
    }

    pub fn is_person(&self) -> bool {
        self.kind == SubjectTypeKind::Person
    }

    /// Households are groups too.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, SubjectTypeKind::Group | SubjectTypeKind::Household)
    }

    pub fn is_household(&self) -> bool {
        self.kind == SubjectTypeKind::Household
    }
}

impl FromResource for SubjectType {
    fn from_resource(resource: &Resource, _ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            kind: SubjectTypeKind::from_wire(resource.str_field("type")),
            allow_empty_location: resource.bool_field("allowEmptyLocation").unwrap_or(false),
            unique_name: resource.bool_field("uniqueName").unwrap_or(false),
            voided: resource.voided(),
        })
    }
}

impl ToResource for SubjectType {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("name", self.name.as_str())
            .insert("type", self.kind.as_str())
            .insert("allowEmptyLocation", self.allow_empty_location)
            .insert("uniqueName", self.unique_name);
        resource
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressLevel {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub level: f64,
    #[serde(rename = "type", default)]
    pub level_type: Option<String>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(AddressLevel, EntityType::AddressLevel);

impl FromResource for AddressLevel {
    fn from_resource(resource: &Resource, _ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("title").or_else(|| resource.string_field("name")).unwrap_or_default(),
            level: resource.f64_field("level").unwrap_or_default(),
            level_type: resource.string_field("type"),
            voided: resource.voided(),
        })
    }
}

impl ToResource for AddressLevel {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("title", self.name.as_str())
            .insert("level", self.level)
            .insert_opt("type", self.level_type.clone());
        resource
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub colour: Option<String>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(Program, EntityType::Program);

impl FromResource for Program {
    fn from_resource(resource: &Resource, _ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            colour: resource.string_field("colour"),
            voided: resource.voided(),
        })
    }
}

impl ToResource for Program {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("name", self.name.as_str())
            .insert_opt("colour", self.colour.clone());
        resource
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterType {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(EncounterType, EntityType::EncounterType);

impl FromResource for EncounterType {
    fn from_resource(resource: &Resource, _ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            voided: resource.voided(),
        })
    }
}

impl ToResource for EncounterType {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource.insert("name", self.name.as_str());
        resource
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierSource {
    pub uuid: EntityUuid,
    pub name: String,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(IdentifierSource, EntityType::IdentifierSource);

impl FromResource for IdentifierSource {
    fn from_resource(resource: &Resource, _ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        Ok(Self {
            uuid: resource.uuid()?,
            name: resource.string_field("name").unwrap_or_default(),
            voided: resource.voided(),
        })
    }
}

impl ToResource for IdentifierSource {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource.insert("name", self.name.as_str());
        resource
    }
}
