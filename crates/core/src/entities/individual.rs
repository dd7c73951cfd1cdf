//! Registered subjects.

use super::{
    base_resource, AddressLevel, Encounter, Gender, GroupSubject,
    IndividualRelationship, Program, ProgramEnrolment, SubjectType, SubjectTypeKind,
};
use crate::age;
use crate::association::ParentEntity;
use crate::collection::ChildCollection;
use crate::config::CoreConfig;
use crate::lifecycle::{FromResource, SyncContext, ToResource};
use crate::merge::merge_child;
use crate::observation::{build_observations, observations_to_resource, Duration, DurationUnit, Observation};
use crate::validation::{ValidationResult, EMPTY_VALIDATION_MESSAGE};
use crate::CoreResult;
use chrono::{NaiveDate, Utc};
use fieldcare_types::EntityType;
use fieldcare_uuid::EntityUuid;
use fieldcare_wire::{format_iso_date, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Form identifiers of the registration fields [`Individual::validate`] checks.
pub mod validation_keys {
    pub const DOB: &str = "DOB";
    pub const GENDER: &str = "GENDER";
    pub const FIRST_NAME: &str = "FIRST_NAME";
    pub const LAST_NAME: &str = "LAST_NAME";
    pub const REGISTRATION_DATE: &str = "REGISTRATION_DATE";
    pub const LOWEST_ADDRESS_LEVEL: &str = "LOWEST_ADDRESS_LEVEL";
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    pub uuid: EntityUuid,
    pub subject_type: SubjectType,
    #[serde(default)]
    pub name: String,
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
    pub enrolments: ChildCollection<ProgramEnrolment>,
    #[serde(default)]
    pub encounters: ChildCollection<Encounter>,
    #[serde(default)]
    pub relationships: ChildCollection<IndividualRelationship>,
    #[serde(default)]
    pub group_subjects: ChildCollection<GroupSubject>,
    #[serde(default)]
    pub groups: ChildCollection<GroupSubject>,
    #[serde(default)]
    pub voided: bool,
}

impl_entity!(Individual, EntityType::Individual);

impl ParentEntity for Individual {}

impl Individual {
    /// A blank registration with every nested value present.
    pub fn create_empty_instance() -> Self {
        Self {
            uuid: EntityUuid::new(),
            subject_type: SubjectType::create("", SubjectTypeKind::Individual),
            name: String::new(),
            first_name: String::new(),
            middle_name: None,
            last_name: None,
            profile_picture: None,
            date_of_birth: None,
            date_of_birth_verified: false,
            gender: Some(Gender::create("")),
            registration_date: Utc::now().date_naive(),
            lowest_address_level: Some(AddressLevel {
                uuid: EntityUuid::new(),
                name: String::new(),
                level: 0.0,
                level_type: None,
                voided: false,
            }),
            observations: Vec::new(),
            enrolments: ChildCollection::new(),
            encounters: ChildCollection::new(),
            relationships: ChildCollection::new(),
            group_subjects: ChildCollection::new(),
            groups: ChildCollection::new(),
            voided: false,
        }
    }

    /// As [`Individual::create_empty_instance`], for subjects that have no gender.
    pub fn create_empty_subject_instance() -> Self {
        Self {
            gender: None,
            ..Self::create_empty_instance()
        }
    }

    pub fn is_person(&self) -> bool {
        self.subject_type.is_person()
    }

    pub fn is_group(&self) -> bool {
        self.subject_type.is_group()
    }

    pub fn is_household(&self) -> bool {
        self.subject_type.is_household()
    }

    /// Display name: first and last name for people, the first name otherwise.
    pub fn name_string(&self) -> String {
        if !self.is_person() {
            return self.first_name.clone();
        }
        match self.last_name.as_deref().filter(|last| !last.is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
        self.name = self.name_string();
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = Some(last_name.into());
        self.name = self.name_string();
    }

    pub fn set_date_of_birth(&mut self, date_of_birth: NaiveDate) {
        self.date_of_birth = Some(date_of_birth);
        self.date_of_birth_verified = true;
    }

    // ------------------------------------------------------------------------
    // Age
    // ------------------------------------------------------------------------

    pub fn age_in_years(&self, as_on: NaiveDate) -> Option<i64> {
        self.date_of_birth.map(|dob| age::years_between(dob, as_on))
    }

    pub fn age_in_months(&self, as_on: NaiveDate) -> Option<i64> {
        self.date_of_birth.map(|dob| age::months_between(dob, as_on))
    }

    pub fn age_in_weeks(&self, as_on: NaiveDate) -> Option<i64> {
        self.date_of_birth.map(|dob| age::weeks_between(dob, as_on))
    }

    /// Age in whole years, or in months under a year.
    pub fn get_age(&self, as_on: NaiveDate) -> Option<Duration> {
        let years = self.age_in_years(as_on)?;
        if years > 0 {
            return Some(Duration::new(years as f64, DurationUnit::Years));
        }
        let months = self.age_in_months(as_on)?;
        if months > 0 {
            return Some(Duration::new(months as f64, DurationUnit::Months));
        }
        Some(Duration::new(0.0, DurationUnit::Years))
    }

    pub fn display_age(&self, today: NaiveDate) -> Option<String> {
        self.date_of_birth.map(|dob| age::display_age(dob, today))
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    fn is_registration_before_date_of_birth(&self) -> bool {
        self.date_of_birth
            .is_some_and(|dob| dob > self.registration_date)
    }

    pub fn validate_date_of_birth(&self, today: NaiveDate, config: &CoreConfig) -> ValidationResult {
        use validation_keys::DOB;
        let Some(dob) = self.date_of_birth else {
            return ValidationResult::failure(DOB, EMPTY_VALIDATION_MESSAGE);
        };
        if age::years_between(dob, today) > i64::from(config.max_age_years()) {
            ValidationResult::failure(DOB, "ageTooHigh")
        } else if self.is_registration_before_date_of_birth() {
            ValidationResult::failure(DOB, "registrationBeforeDateOfBirth")
        } else if dob > today {
            ValidationResult::failure(DOB, "birthDateInFuture")
        } else {
            ValidationResult::successful(DOB)
        }
    }

    pub fn validate_registration_date(&self, today: NaiveDate) -> ValidationResult {
        use validation_keys::REGISTRATION_DATE;
        if self.is_registration_before_date_of_birth() {
            ValidationResult::failure(REGISTRATION_DATE, "registrationBeforeDateOfBirth")
        } else if self.registration_date > today {
            ValidationResult::failure(REGISTRATION_DATE, "registrationDateInFuture")
        } else {
            ValidationResult::successful(REGISTRATION_DATE)
        }
    }

    pub fn validate_first_name(&self) -> ValidationResult {
        ValidationResult::for_empty(Some(self.first_name.as_str()), validation_keys::FIRST_NAME)
    }

    pub fn validate_last_name(&self) -> ValidationResult {
        ValidationResult::for_empty(self.last_name.as_deref(), validation_keys::LAST_NAME)
    }

    pub fn validate_gender(&self) -> ValidationResult {
        ValidationResult::for_empty(
            self.gender.as_ref().map(|g| g.name.as_str()),
            validation_keys::GENDER,
        )
    }

    pub fn validate_address(&self) -> ValidationResult {
        ValidationResult::for_empty(
            self.lowest_address_level.as_ref().map(|a| a.name.as_str()),
            validation_keys::LOWEST_ADDRESS_LEVEL,
        )
    }

    /// Checks the registration fields. People additionally need a last name, a plausible date of
    /// birth and a gender.
    pub fn validate(&self, today: NaiveDate, config: &CoreConfig) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        if !self.subject_type.allow_empty_location {
            results.push(self.validate_address());
        }
        results.push(self.validate_registration_date(today));
        results.push(self.validate_first_name());
        if self.is_person() {
            results.push(self.validate_last_name());
            results.push(self.validate_date_of_birth(today, config));
            results.push(self.validate_gender());
        }
        results
    }

    // ------------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------------

    pub fn non_voided_enrolments(&self) -> Vec<&ProgramEnrolment> {
        self.enrolments.non_voided().collect()
    }

    pub fn non_voided_encounters(&self) -> Vec<&Encounter> {
        self.encounters.non_voided().collect()
    }

    pub fn get_relationships(&self) -> Vec<&IndividualRelationship> {
        self.relationships.non_voided().collect()
    }

    pub fn get_group_subjects(&self) -> Vec<&GroupSubject> {
        self.group_subjects.non_voided().collect()
    }

    pub fn get_groups(&self) -> Vec<&GroupSubject> {
        self.groups.non_voided().collect()
    }

    pub fn add_enrolment(&mut self, enrolment: ProgramEnrolment) -> bool {
        merge_child(&mut self.enrolments, enrolment)
    }

    pub fn add_encounter(&mut self, encounter: Encounter) -> bool {
        merge_child(&mut self.encounters, encounter)
    }

    pub fn add_relationship(&mut self, relationship: IndividualRelationship) -> bool {
        merge_child(&mut self.relationships, relationship)
    }

    pub fn add_group_subject(&mut self, group_subject: GroupSubject) -> bool {
        merge_child(&mut self.group_subjects, group_subject)
    }

    pub fn add_group(&mut self, group_subject: GroupSubject) -> bool {
        merge_child(&mut self.groups, group_subject)
    }

    pub fn find_enrolment(&self, enrolment_uuid: &str) -> Option<&ProgramEnrolment> {
        self.enrolments
            .get(enrolment_uuid)
            .filter(|enrolment| !enrolment.voided)
    }

    pub fn has_active_enrolment(&self) -> bool {
        self.enrolments.non_voided().any(ProgramEnrolment::is_active)
    }

    /// Programs from `all_programs` without an active enrolment.
    pub fn eligible_programs(&self, all_programs: &[Program]) -> Vec<Program> {
        all_programs
            .iter()
            .filter(|program| {
                !self.enrolments.non_voided().any(|enrolment| {
                    enrolment.program.uuid == program.uuid && enrolment.is_active()
                })
            })
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------------
    // Observations
    // ------------------------------------------------------------------------

    /// Finds an observation by concept name or uuid, optionally inside a question group.
    pub fn find_observation(
        &self,
        concept_name_or_uuid: &str,
        parent_concept_name_or_uuid: Option<&str>,
    ) -> Option<&Observation> {
        let observations: &[Observation] = match parent_concept_name_or_uuid {
            None => &self.observations,
            Some(parent) => {
                let group = find_by_name_or_uuid(&self.observations, parent)?;
                &group.value.as_question_group()?.group_observations
            }
        };
        find_by_name_or_uuid(observations, concept_name_or_uuid)
    }

    pub fn get_observation_value(
        &self,
        concept_name_or_uuid: &str,
        parent_concept_name_or_uuid: Option<&str>,
    ) -> Option<Value> {
        self.find_observation(concept_name_or_uuid, parent_concept_name_or_uuid)
            .map(Observation::get_value)
    }

    // ------------------------------------------------------------------------
    // Copies
    // ------------------------------------------------------------------------

    /// An editable copy: observations are deep-copied, child collections shared by value.
    pub fn clone_for_edit(&self) -> Self {
        Self {
            observations: self
                .observations
                .iter()
                .map(Observation::clone_for_edit)
                .collect(),
            ..self.clone()
        }
    }

    /// The identifying subset embedded into other records.
    pub fn clone_for_reference(&self) -> Self {
        Self {
            uuid: self.uuid.clone(),
            subject_type: self.subject_type.clone(),
            name: self.name.clone(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            profile_picture: self.profile_picture.clone(),
            date_of_birth: self.date_of_birth,
            date_of_birth_verified: self.date_of_birth_verified,
            gender: self.gender.clone(),
            registration_date: self.registration_date,
            lowest_address_level: None,
            observations: Vec::new(),
            enrolments: ChildCollection::new(),
            encounters: ChildCollection::new(),
            relationships: ChildCollection::new(),
            group_subjects: ChildCollection::new(),
            groups: ChildCollection::new(),
            voided: self.voided,
        }
    }
}

fn find_by_name_or_uuid<'a>(observations: &'a [Observation], key: &str) -> Option<&'a Observation> {
    observations
        .iter()
        .find(|obs| obs.concept.name == key || obs.concept_uuid() == key)
}

impl FromResource for Individual {
    fn from_resource(resource: &Resource, ctx: &mut SyncContext<'_>) -> CoreResult<Self> {
        let uuid = resource.uuid()?;
        let subject_type: SubjectType =
            ctx.parent(EntityType::Individual, resource, "subjectTypeUUID")?;
        let observations = build_observations(
            ctx.store(),
            EntityType::Individual,
            uuid.as_str(),
            resource.get("observations"),
        )?;
        let mut individual = Self {
            uuid,
            subject_type,
            name: String::new(),
            first_name: resource.string_field("firstName").unwrap_or_default(),
            middle_name: resource.string_field("middleName"),
            last_name: resource.string_field("lastName"),
            profile_picture: resource.string_field("profilePicture"),
            date_of_birth: resource.date_field("dateOfBirth")?,
            date_of_birth_verified: resource.bool_field("dateOfBirthVerified").unwrap_or(false),
            gender: ctx.optional_parent(resource, "genderUUID")?,
            registration_date: resource.required_date("registrationDate")?,
            lowest_address_level: ctx.optional_parent(resource, "addressUUID")?,
            observations,
            enrolments: ChildCollection::new(),
            encounters: ChildCollection::new(),
            relationships: ChildCollection::new(),
            group_subjects: ChildCollection::new(),
            groups: ChildCollection::new(),
            voided: resource.voided(),
        };
        individual.name = individual.name_string();
        Ok(individual)
    }
}

impl ToResource for Individual {
    fn to_resource(&self) -> Resource {
        let mut resource = base_resource(&self.uuid, self.voided);
        resource
            .insert("firstName", self.first_name.as_str())
            .insert_opt("middleName", self.middle_name.clone())
            .insert_opt("lastName", self.last_name.clone())
            .insert_opt("profilePicture", self.profile_picture.clone())
            .insert("dateOfBirthVerified", self.date_of_birth_verified)
            .insert_opt("dateOfBirth", self.date_of_birth.map(format_iso_date))
            .insert("registrationDate", format_iso_date(self.registration_date))
            .insert_opt(
                "genderUUID",
                self.gender.as_ref().map(|g| g.uuid.to_string()),
            )
            .insert_opt(
                "addressUUID",
                self.lowest_address_level.as_ref().map(|a| a.uuid.to_string()),
            )
            .insert("subjectTypeUUID", self.subject_type.uuid.as_str())
            .insert("observations", observations_to_resource(&self.observations));
        resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Concept;
    use crate::entity_ref::EntityRef;
    use crate::mapper::{find_entity, save_entity};
    use crate::store::{InMemoryStore, UpdateMode};
    use crate::CoreError;
    use chrono::DateTime;
    use fieldcare_types::ConceptDataType;
    use fieldcare_wire::{ResourcePage, WireError};
    use serde_json::json;

    fn uuid(s: &str) -> EntityUuid {
        EntityUuid::from_wire(s).expect("uuid")
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    fn person() -> Individual {
        let mut individual = Individual::create_empty_instance();
        individual.subject_type = SubjectType::create("Person", SubjectTypeKind::Person);
        individual.set_first_name("Asha");
        individual.set_last_name("Devi");
        individual.gender = Some(Gender::create("Female"));
        individual.lowest_address_level = Some(AddressLevel {
            uuid: uuid("a1"),
            name: "Village".into(),
            level: 1.0,
            level_type: None,
            voided: false,
        });
        individual.registration_date = date("2023-06-01");
        individual.set_date_of_birth(date("1990-01-01"));
        individual
    }

    fn enrolment(id: &str, program: &Program, exited: bool) -> ProgramEnrolment {
        let mut enrolment = ProgramEnrolment::create(
            EntityRef::new(uuid("i1")),
            program.clone(),
            DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp"),
        );
        enrolment.uuid = uuid(id);
        if exited {
            enrolment.program_exit_date_time = DateTime::from_timestamp(1_700_100_000, 0);
        }
        enrolment
    }

    #[test]
    fn empty_instance_is_fully_populated() {
        let individual = Individual::create_empty_instance();
        assert!(individual.gender.is_some());
        assert!(individual.lowest_address_level.is_some());
        assert!(individual.observations.is_empty());
        assert!(individual.enrolments.is_empty());

        assert!(Individual::create_empty_subject_instance().gender.is_none());
    }

    #[test]
    fn name_depends_on_subject_kind() {
        let mut individual = person();
        assert_eq!(individual.name, "Asha Devi");

        individual.subject_type = SubjectType::create("Household", SubjectTypeKind::Household);
        assert_eq!(individual.name_string(), "Asha");
    }

    #[test]
    fn valid_person_passes_every_check() {
        let results = person().validate(date("2023-06-13"), &CoreConfig::default());
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.success), "{results:?}");
    }

    #[test]
    fn date_of_birth_checks() {
        let config = CoreConfig::default();
        let today = date("2023-06-13");
        let mut individual = person();

        individual.date_of_birth = Some(date("1890-01-01"));
        assert_eq!(
            individual.validate_date_of_birth(today, &config).message_key.as_deref(),
            Some("ageTooHigh")
        );

        individual.date_of_birth = Some(date("2023-06-05"));
        assert_eq!(
            individual.validate_date_of_birth(today, &config).message_key.as_deref(),
            Some("registrationBeforeDateOfBirth")
        );
        assert!(!individual.validate_registration_date(today).success);

        individual.date_of_birth = None;
        assert_eq!(
            individual.validate_date_of_birth(today, &config).message_key.as_deref(),
            Some(EMPTY_VALIDATION_MESSAGE)
        );
    }

    #[test]
    fn non_person_skips_person_checks() {
        let mut individual = person();
        individual.subject_type = SubjectType::create("Household", SubjectTypeKind::Household);
        individual.subject_type.allow_empty_location = true;
        individual.gender = None;

        let results = individual.validate(date("2023-06-13"), &CoreConfig::default());
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn ages() {
        let individual = person();
        let as_on = date("2023-06-13");
        assert_eq!(individual.age_in_years(as_on), Some(33));
        assert_eq!(individual.display_age(as_on).as_deref(), Some("33 years"));
        assert_eq!(
            individual.get_age(as_on),
            Some(Duration::new(33.0, DurationUnit::Years))
        );

        let mut infant = person();
        infant.date_of_birth = Some(date("2023-02-01"));
        assert_eq!(
            infant.get_age(as_on),
            Some(Duration::new(4.0, DurationUnit::Months))
        );
    }

    #[test]
    fn enrolments_dedup_and_eligibility() {
        let mut individual = person();
        let (tb, mch) = (
            Program {
                uuid: uuid("p1"),
                name: "TB".into(),
                colour: None,
                voided: false,
            },
            Program {
                uuid: uuid("p2"),
                name: "MCH".into(),
                colour: None,
                voided: false,
            },
        );

        assert!(individual.add_enrolment(enrolment("e1", &tb, false)));
        assert!(!individual.add_enrolment(enrolment("e1", &tb, true)));
        assert!(individual.add_enrolment(enrolment("e2", &mch, true)));

        assert!(individual.has_active_enrolment());
        let eligible = individual.eligible_programs(&[tb, mch]);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].name, "MCH");
        assert!(individual.find_enrolment("e2").is_some());
    }

    fn seeded_store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        let subject_type = SubjectType {
            uuid: uuid("st1"),
            ..SubjectType::create("Person", SubjectTypeKind::Person)
        };
        save_entity(&mut store, &subject_type, UpdateMode::All).expect("subject type");
        let gender = Gender {
            uuid: uuid("g1"),
            ..Gender::create("Female")
        };
        save_entity(&mut store, &gender, UpdateMode::All).expect("gender");
        let weight = Concept::create("Weight", ConceptDataType::Numeric, Vec::new(), uuid("w"));
        save_entity(&mut store, &weight, UpdateMode::All).expect("concept");
        store
    }

    #[test]
    fn from_resource_resolves_references_and_observations() {
        let mut store = seeded_store();
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(&mut store, &page, &config);

        let resource = Resource::from_value(json!({
            "uuid": "i1", "firstName": "Asha", "lastName": "Devi",
            "dateOfBirth": "1990-01-01", "registrationDate": "2023-06-01",
            "subjectTypeUUID": "st1", "genderUUID": "g1", "addressUUID": "missing",
            "observations": {"w": 52.5}
        }))
        .expect("resource");
        let individual = Individual::from_resource(&resource, &mut ctx).expect("built");

        assert_eq!(individual.name, "Asha Devi");
        assert_eq!(individual.gender.as_ref().map(|g| g.name.as_str()), Some("Female"));
        assert!(individual.lowest_address_level.is_none());
        assert_eq!(
            individual.get_observation_value("Weight", None),
            Some(json!(52.5))
        );
        assert!(!individual.voided);

        let again =
            Individual::from_resource(&individual.to_resource(), &mut ctx).expect("round trip");
        assert_eq!(again, individual);
    }

    #[test]
    fn missing_subject_type_is_association_error() {
        let mut store = InMemoryStore::new();
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(&mut store, &page, &config);

        let resource = Resource::from_value(json!({
            "uuid": "i1", "firstName": "A", "registrationDate": "2023-06-01",
            "subjectTypeUUID": "st9"
        }))
        .expect("resource");
        match Individual::from_resource(&resource, &mut ctx) {
            Err(CoreError::Association(err)) => {
                assert_eq!(err.code(), "Individual-SubjectType-Association")
            }
            other => panic!("expected Association, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_registration_date_is_wire_error() {
        let mut store = seeded_store();
        let page = ResourcePage::default();
        let config = CoreConfig::default();
        let mut ctx = SyncContext::new(&mut store, &page, &config);

        let resource = Resource::from_value(json!({
            "uuid": "i1", "firstName": "A", "registrationDate": "yesterday",
            "subjectTypeUUID": "st1"
        }))
        .expect("resource");
        let err = Individual::from_resource(&resource, &mut ctx).expect_err("should fail");
        assert!(matches!(err, CoreError::Wire(WireError::InvalidDate { .. })));
    }

    #[test]
    fn stored_form_round_trips_through_mapper() {
        let mut store = InMemoryStore::new();
        let individual = person();
        save_entity(&mut store, &individual, UpdateMode::All).expect("save");

        let found: Individual = find_entity(&store, individual.uuid.as_str())
            .expect("find")
            .expect("present");
        assert_eq!(found, individual);
    }

    #[test]
    fn clone_for_edit_leaves_source_untouched() {
        let individual = person();
        let mut copy = individual.clone_for_edit();
        copy.set_first_name("Changed");
        assert_eq!(individual.first_name, "Asha");

        let reference = individual.clone_for_reference();
        assert_eq!(reference.uuid, individual.uuid);
        assert!(reference.observations.is_empty());
    }
}
