//! Locally held records that never arrive from the server.

use super::{AddressLevel, Gender, Individual, SubjectType};
use crate::collection::ChildCollection;
use crate::observation::Observation;
use chrono::{DateTime, NaiveDate, Utc};
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use serde::{Deserialize, Serialize};

/// An unfinished registration saved on the device.
///
/// Drafts captured against an older version of a registration form are purged when that form
/// syncs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSubject {
    pub uuid: EntityUuid,
    pub subject_type: SubjectType,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_birth_verified: bool,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub registration_date: NaiveDate,
    #[serde(default)]
    pub lowest_address_level: Option<AddressLevel>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub total_members: Option<String>,
    pub updated_on: DateTime<Utc>,
}

impl_entity!(DraftSubject, EntityType::DraftSubject, unvoidable);

impl DraftSubject {
    /// Snapshots `individual` as a draft. An empty member count is not kept.
    pub fn create(individual: &Individual, total_members: Option<String>) -> Self {
        Self {
            uuid: individual.uuid.clone(),
            subject_type: individual.subject_type.clone(),
            first_name: individual.first_name.clone(),
            middle_name: individual.middle_name.clone(),
            last_name: individual.last_name.clone(),
            profile_picture: individual.profile_picture.clone(),
            date_of_birth: individual.date_of_birth,
            date_of_birth_verified: individual.date_of_birth_verified,
            gender: individual.gender.clone(),
            registration_date: individual.registration_date,
            lowest_address_level: individual.lowest_address_level.clone(),
            observations: individual.observations.clone(),
            total_members: total_members.filter(|members| !members.is_empty()),
            updated_on: Utc::now(),
        }
    }

    /// Rebuilds an editable subject from the draft.
    pub fn construct_individual(&self) -> Individual {
        let mut individual = Individual {
            uuid: self.uuid.clone(),
            subject_type: self.subject_type.clone(),
            name: String::new(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: self.profile_picture.clone(),
            date_of_birth: self.date_of_birth,
            date_of_birth_verified: self.date_of_birth_verified,
            gender: self.gender.clone(),
            registration_date: self.registration_date,
            lowest_address_level: self.lowest_address_level.clone(),
            observations: self
                .observations
                .iter()
                .map(Observation::clone_for_edit)
                .collect(),
            enrolments: ChildCollection::new(),
            encounters: ChildCollection::new(),
            relationships: ChildCollection::new(),
            group_subjects: ChildCollection::new(),
            groups: ChildCollection::new(),
            voided: false,
        };
        individual.name = individual.name_string();
        individual
    }
}

/// When an entity type was last loaded from the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySyncStatus {
    pub uuid: EntityUuid,
    pub entity_name: String,
    #[serde(default)]
    pub loaded_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entity_type_uuid: Option<String>,
}

impl_entity!(EntitySyncStatus, EntityType::EntitySyncStatus, unvoidable);

impl EntitySyncStatus {
    pub fn create(entity_name: impl Into<String>, loaded_since: Option<DateTime<Utc>>) -> Self {
        Self {
            uuid: EntityUuid::new(),
            entity_name: entity_name.into(),
            loaded_since,
            entity_type_uuid: None,
        }
    }
}
