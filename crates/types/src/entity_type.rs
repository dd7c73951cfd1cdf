use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Discriminator for every independently persisted entity.
///
/// The variant name is also the schema name used by the store and by sync bundles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    // reference data
    Gender,
    SubjectType,
    AddressLevel,
    Program,
    EncounterType,
    IdentifierSource,
    // metadata
    Concept,
    ConceptAnswer,
    Form,
    FormElementGroup,
    FormElement,
    FormMapping,
    ChecklistDetail,
    ChecklistItemDetail,
    // transactional
    Individual,
    ProgramEnrolment,
    Encounter,
    IndividualRelationship,
    GroupSubject,
    Checklist,
    ChecklistItem,
    IdentifierAssignment,
    DraftSubject,
    EntitySyncStatus,
}

/// A collection owned by a parent entity type.
///
/// A child of type `child` joins the parent's `collection` field; the child's resource names the
/// parent through `foreign_key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildAssociation {
    pub child: EntityType,
    pub foreign_key: &'static str,
    pub collection: &'static str,
}

const CONCEPT_CHILDREN: &[ChildAssociation] = &[ChildAssociation {
    child: EntityType::ConceptAnswer,
    foreign_key: "conceptUUID",
    collection: "answers",
}];

const FORM_CHILDREN: &[ChildAssociation] = &[ChildAssociation {
    child: EntityType::FormElementGroup,
    foreign_key: "formUUID",
    collection: "formElementGroups",
}];

const FORM_ELEMENT_GROUP_CHILDREN: &[ChildAssociation] = &[ChildAssociation {
    child: EntityType::FormElement,
    foreign_key: "formElementGroupUUID",
    collection: "formElements",
}];

const CHECKLIST_DETAIL_CHILDREN: &[ChildAssociation] = &[ChildAssociation {
    child: EntityType::ChecklistItemDetail,
    foreign_key: "checklistDetailUUID",
    collection: "items",
}];

// GroupSubject is owned twice: by the group and by the member.
const INDIVIDUAL_CHILDREN: &[ChildAssociation] = &[
    ChildAssociation {
        child: EntityType::ProgramEnrolment,
        foreign_key: "individualUUID",
        collection: "enrolments",
    },
    ChildAssociation {
        child: EntityType::Encounter,
        foreign_key: "individualUUID",
        collection: "encounters",
    },
    ChildAssociation {
        child: EntityType::IndividualRelationship,
        foreign_key: "individualAUUID",
        collection: "relationships",
    },
    ChildAssociation {
        child: EntityType::GroupSubject,
        foreign_key: "groupSubjectUUID",
        collection: "groupSubjects",
    },
    ChildAssociation {
        child: EntityType::GroupSubject,
        foreign_key: "memberSubjectUUID",
        collection: "groups",
    },
];

const PROGRAM_ENROLMENT_CHILDREN: &[ChildAssociation] = &[ChildAssociation {
    child: EntityType::Checklist,
    foreign_key: "programEnrolmentUUID",
    collection: "checklists",
}];

const CHECKLIST_CHILDREN: &[ChildAssociation] = &[ChildAssociation {
    child: EntityType::ChecklistItem,
    foreign_key: "checklistUUID",
    collection: "items",
}];

impl EntityType {
    /// Every entity type, in sync dependency order (reference data first).
    pub const ALL: [EntityType; 24] = [
        EntityType::Gender,
        EntityType::SubjectType,
        EntityType::AddressLevel,
        EntityType::Program,
        EntityType::EncounterType,
        EntityType::IdentifierSource,
        EntityType::Concept,
        EntityType::ConceptAnswer,
        EntityType::Form,
        EntityType::FormElementGroup,
        EntityType::FormElement,
        EntityType::FormMapping,
        EntityType::ChecklistDetail,
        EntityType::ChecklistItemDetail,
        EntityType::Individual,
        EntityType::ProgramEnrolment,
        EntityType::Encounter,
        EntityType::IndividualRelationship,
        EntityType::GroupSubject,
        EntityType::Checklist,
        EntityType::ChecklistItem,
        EntityType::IdentifierAssignment,
        EntityType::DraftSubject,
        EntityType::EntitySyncStatus,
    ];

    /// Returns the schema name of this entity type.
    pub fn schema_name(self) -> &'static str {
        match self {
            EntityType::Gender => "Gender",
            EntityType::SubjectType => "SubjectType",
            EntityType::AddressLevel => "AddressLevel",
            EntityType::Program => "Program",
            EntityType::EncounterType => "EncounterType",
            EntityType::IdentifierSource => "IdentifierSource",
            EntityType::Concept => "Concept",
            EntityType::ConceptAnswer => "ConceptAnswer",
            EntityType::Form => "Form",
            EntityType::FormElementGroup => "FormElementGroup",
            EntityType::FormElement => "FormElement",
            EntityType::FormMapping => "FormMapping",
            EntityType::ChecklistDetail => "ChecklistDetail",
            EntityType::ChecklistItemDetail => "ChecklistItemDetail",
            EntityType::Individual => "Individual",
            EntityType::ProgramEnrolment => "ProgramEnrolment",
            EntityType::Encounter => "Encounter",
            EntityType::IndividualRelationship => "IndividualRelationship",
            EntityType::GroupSubject => "GroupSubject",
            EntityType::Checklist => "Checklist",
            EntityType::ChecklistItem => "ChecklistItem",
            EntityType::IdentifierAssignment => "IdentifierAssignment",
            EntityType::DraftSubject => "DraftSubject",
            EntityType::EntitySyncStatus => "EntitySyncStatus",
        }
    }

    /// Parent entity types a resource of this type refers to, with the foreign-key field naming
    /// each one.
    ///
    /// A parent type may appear more than once when the child plays two roles against it
    /// (for example a group subject names both the group and the member individual).
    pub fn parent_associations(self) -> &'static [(EntityType, &'static str)] {
        use EntityType::*;
        match self {
            ConceptAnswer => &[(Concept, "conceptUUID")],
            FormElementGroup => &[(Form, "formUUID")],
            FormElement => &[
                (FormElementGroup, "formElementGroupUUID"),
                (Concept, "conceptUUID"),
            ],
            FormMapping => &[(Form, "formUUID"), (SubjectType, "subjectTypeUUID")],
            ChecklistItemDetail => &[
                (ChecklistDetail, "checklistDetailUUID"),
                (Form, "formUUID"),
                (Concept, "conceptUUID"),
                (ChecklistItemDetail, "leadDetailUUID"),
            ],
            Individual => &[
                (SubjectType, "subjectTypeUUID"),
                (AddressLevel, "addressUUID"),
                (Gender, "genderUUID"),
            ],
            ProgramEnrolment => &[(Individual, "individualUUID"), (Program, "programUUID")],
            Encounter => &[
                (Individual, "individualUUID"),
                (EncounterType, "encounterTypeUUID"),
            ],
            IndividualRelationship => &[
                (Individual, "individualAUUID"),
                (Individual, "individualBUUID"),
            ],
            GroupSubject => &[
                (Individual, "groupSubjectUUID"),
                (Individual, "memberSubjectUUID"),
            ],
            Checklist => &[
                (ProgramEnrolment, "programEnrolmentUUID"),
                (ChecklistDetail, "checklistDetailUUID"),
            ],
            ChecklistItem => &[
                (Checklist, "checklistUUID"),
                (ChecklistItemDetail, "checklistItemDetailUUID"),
            ],
            IdentifierAssignment => &[
                (IdentifierSource, "identifierSourceUUID"),
                (Individual, "individualUUID"),
                (ProgramEnrolment, "programEnrolmentUUID"),
            ],
            DraftSubject => &[(SubjectType, "subjectTypeUUID")],
            Gender | SubjectType | AddressLevel | Program | EncounterType | IdentifierSource
            | Concept | Form | ChecklistDetail | EntitySyncStatus => &[],
        }
    }

    /// Collections this entity type owns.
    ///
    /// Every child in one of these collections is itself persisted under its own type; the parent
    /// record links to it.
    pub fn child_associations(self) -> &'static [ChildAssociation] {
        match self {
            EntityType::Concept => CONCEPT_CHILDREN,
            EntityType::Form => FORM_CHILDREN,
            EntityType::FormElementGroup => FORM_ELEMENT_GROUP_CHILDREN,
            EntityType::ChecklistDetail => CHECKLIST_DETAIL_CHILDREN,
            EntityType::Individual => INDIVIDUAL_CHILDREN,
            EntityType::ProgramEnrolment => PROGRAM_ENROLMENT_CHILDREN,
            EntityType::Checklist => CHECKLIST_CHILDREN,
            _ => &[],
        }
    }

    /// Parent types that own a collection of this type, each with the owning association.
    pub fn owners(self) -> Vec<(EntityType, &'static ChildAssociation)> {
        EntityType::ALL
            .iter()
            .flat_map(|parent| {
                parent
                    .child_associations()
                    .iter()
                    .filter(move |assoc| assoc.child == self)
                    .map(move |assoc| (*parent, assoc))
            })
            .collect()
    }

    /// Returns the child type stored in `collection`, if this type owns such a collection.
    pub fn collection_child(self, collection: &str) -> Option<EntityType> {
        self.child_associations()
            .iter()
            .find(|assoc| assoc.collection == collection)
            .map(|assoc| assoc.child)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_name())
    }
}

impl FromStr for EntityType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|t| t.schema_name() == s)
            .ok_or_else(|| TypesError::UnknownEntityType(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_round_trip_through_from_str() {
        for t in EntityType::ALL {
            let parsed: EntityType = t.schema_name().parse().expect("known type");
            assert_eq!(parsed, t);
        }
    }

    #[test]
    fn unknown_schema_name_is_rejected() {
        match "Comment".parse::<EntityType>() {
            Err(TypesError::UnknownEntityType(name)) => assert_eq!(name, "Comment"),
            other => panic!("expected UnknownEntityType, got {other:?}"),
        }
    }

    #[test]
    fn concept_answer_refers_to_concept() {
        assert_eq!(
            EntityType::ConceptAnswer.parent_associations(),
            &[(EntityType::Concept, "conceptUUID")]
        );
    }

    #[test]
    fn group_subject_has_two_owning_collections_on_individual() {
        let owners = EntityType::GroupSubject.owners();
        let collections: Vec<&str> = owners.iter().map(|(_, a)| a.collection).collect();

        assert_eq!(owners.len(), 2);
        assert!(owners.iter().all(|(p, _)| *p == EntityType::Individual));
        assert_eq!(collections, vec!["groupSubjects", "groups"]);
    }

    #[test]
    fn owning_foreign_keys_are_declared_parent_associations() {
        for parent in EntityType::ALL {
            for assoc in parent.child_associations() {
                assert!(
                    assoc
                        .child
                        .parent_associations()
                        .contains(&(parent, assoc.foreign_key)),
                    "{} -> {} via {} is not declared",
                    assoc.child,
                    parent,
                    assoc.foreign_key
                );
            }
        }
    }

    #[test]
    fn collection_child_finds_owned_type() {
        assert_eq!(
            EntityType::Form.collection_child("formElementGroups"),
            Some(EntityType::FormElementGroup)
        );
        assert_eq!(EntityType::Form.collection_child("answers"), None);
    }

    #[test]
    fn owning_types_expose_their_collections() {
        let owning: Vec<EntityType> = EntityType::ALL
            .into_iter()
            .filter(|entity_type| !entity_type.child_associations().is_empty())
            .collect();
        assert_eq!(
            owning,
            vec![
                EntityType::Concept,
                EntityType::Form,
                EntityType::FormElementGroup,
                EntityType::ChecklistDetail,
                EntityType::Individual,
                EntityType::ProgramEnrolment,
                EntityType::Checklist,
            ]
        );
        assert_eq!(EntityType::Individual.child_associations().len(), 5);
        assert_eq!(
            EntityType::Checklist.collection_child("items"),
            Some(EntityType::ChecklistItem)
        );
    }
}
