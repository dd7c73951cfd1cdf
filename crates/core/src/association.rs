//! Resource association resolver.
//!
//! During sync a child resource names its parents by uuid. Resolution looks each parent up in
//! the store; a parent that is not there yet is a hard [`AssociationError`]. Once a child has
//! been built, [`associate_child`] produces the parent-side projections that add the child to
//! each owning collection.

use crate::collection::ChildCollection;
use crate::error::AssociationError;
use crate::mapper::Entity;
use crate::merge::merge_child;
use crate::store::{EntityStore, Record};
use crate::{CoreError, CoreResult};
use fieldcare_types::EntityType;
use fieldcare_wire::Resource;

/// Resolves the parent named by `foreign_key` on `resource`.
///
/// # Errors
///
/// Returns [`AssociationError`] if the resource carries no uuid for `foreign_key`, or if no
/// `parent_type` record with that uuid is in the store.
pub fn resolve_parent(
    store: &dyn EntityStore,
    child_type: EntityType,
    resource: &Resource,
    foreign_key: &str,
    parent_type: EntityType,
) -> Result<Record, AssociationError> {
    let parent_uuid = resource.uuid_for(foreign_key);
    parent_uuid
        .as_ref()
        .and_then(|uuid| store.find_by_key("uuid", uuid.as_str(), parent_type))
        .ok_or_else(|| {
            AssociationError::new(
                child_type,
                parent_type,
                resource.uuid_str().unwrap_or_default(),
                parent_uuid.map(|uuid| uuid.as_str().to_owned()),
            )
        })
}

/// Lenient variant of [`resolve_parent`]: `None` when the key is absent or the parent unknown.
pub fn find_optional_parent(
    store: &dyn EntityStore,
    resource: &Resource,
    foreign_key: &str,
    parent_type: EntityType,
) -> Option<Record> {
    let uuid = resource.uuid_for(foreign_key)?;
    store.find_by_key("uuid", uuid.as_str(), parent_type)
}

/// Parents of a child that plays two roles against the same parent type.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupParents {
    pub group: Record,
    /// `None` only for a voided child whose member could not be resolved.
    pub member: Option<Record>,
}

/// Resolves the group and member parents of a group-affiliation child.
///
/// A voided child whose member no longer resolves keeps its group parent; the member is skipped.
///
/// # Errors
///
/// Returns [`AssociationError`] if the group cannot be resolved, or if the member cannot be
/// resolved and the child is not voided.
pub fn resolve_group_association(
    store: &dyn EntityStore,
    child_type: EntityType,
    resource: &Resource,
    group_key: &str,
    member_key: &str,
    parent_type: EntityType,
) -> Result<GroupParents, AssociationError> {
    let group = resolve_parent(store, child_type, resource, group_key, parent_type)?;
    let member = match resolve_parent(store, child_type, resource, member_key, parent_type) {
        Ok(member) => Some(member),
        Err(err) if resource.voided() => {
            tracing::warn!(code = %err.code(), "{err}; skipping member of voided membership");
            None
        }
        Err(err) => return Err(err),
    };
    Ok(GroupParents { group, member })
}

/// Resolves every declared parent whose foreign key is present on `resource`.
///
/// # Errors
///
/// Returns the first [`AssociationError`] encountered.
pub fn validate_parent_associations(
    store: &dyn EntityStore,
    child_type: EntityType,
    resource: &Resource,
) -> Result<(), AssociationError> {
    for (parent_type, foreign_key) in child_type.parent_associations() {
        if resource.uuid_for(foreign_key).is_some() {
            resolve_parent(store, child_type, resource, foreign_key, *parent_type)?;
        }
    }
    Ok(())
}

// ============================================================================
// Parent-side merge
// ============================================================================

/// How a parent takes in a child of a given type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// One foreign key, one collection.
    Single {
        foreign_key: &'static str,
        collection: &'static str,
    },
    /// The child joins a collection on the group parent and another on the member parent.
    GroupAffiliation {
        group_key: &'static str,
        group_collection: &'static str,
        member_key: &'static str,
        member_collection: &'static str,
    },
}

/// Derives the merge strategy from the owned-collection table.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedChild`] if `parent_type` owns no collection of `child_type`.
pub fn merge_strategy(parent_type: EntityType, child_type: EntityType) -> CoreResult<MergeStrategy> {
    let owned: Vec<_> = parent_type
        .child_associations()
        .iter()
        .filter(|assoc| assoc.child == child_type)
        .collect();
    match owned.as_slice() {
        [single] => Ok(MergeStrategy::Single {
            foreign_key: single.foreign_key,
            collection: single.collection,
        }),
        [group, member] => Ok(MergeStrategy::GroupAffiliation {
            group_key: group.foreign_key,
            group_collection: group.collection,
            member_key: member.foreign_key,
            member_collection: member.collection,
        }),
        _ => Err(CoreError::UnsupportedChild {
            child: child_type,
            parent: parent_type,
        }),
    }
}

/// An entity that owns child collections.
pub trait ParentEntity: Entity {
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedChild`] for a child type this parent does not own.
    fn merge_strategy_for(child_type: EntityType) -> CoreResult<MergeStrategy> {
        merge_strategy(Self::TYPE, child_type)
    }
}

/// A copy-on-read projection of a parent: its uuid plus one collection field.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub parent_type: EntityType,
    pub collection: &'static str,
    pub record: Record,
}

impl Projection {
    pub fn parent_uuid(&self) -> &str {
        self.record.uuid().unwrap_or_default()
    }
}

/// Resolves the owning parent(s) of a freshly built child and adds the child to each.
///
/// `child_record` is the child's store record; only its scalar fields are carried into the
/// projection.
///
/// # Errors
///
/// Returns [`CoreError::Association`] when a parent cannot be resolved.
pub fn associate_child(
    store: &dyn EntityStore,
    parent_type: EntityType,
    child_type: EntityType,
    strategy: MergeStrategy,
    child_record: &Record,
    child_resource: &Resource,
) -> CoreResult<Vec<Projection>> {
    let owned_fields: Vec<&str> = child_type
        .child_associations()
        .iter()
        .map(|assoc| assoc.collection)
        .collect();
    let child = child_record.without_fields(&owned_fields);

    match strategy {
        MergeStrategy::Single {
            foreign_key,
            collection,
        } => {
            let parent =
                resolve_parent(store, child_type, child_resource, foreign_key, parent_type)?;
            Ok(vec![project(parent_type, &parent, collection, child)])
        }
        MergeStrategy::GroupAffiliation {
            group_key,
            group_collection,
            member_key,
            member_collection,
        } => {
            let parents = resolve_group_association(
                store,
                child_type,
                child_resource,
                group_key,
                member_key,
                parent_type,
            )?;
            let mut projections = vec![project(
                parent_type,
                &parents.group,
                group_collection,
                child.clone(),
            )];
            if let Some(member) = parents.member {
                projections.push(project(parent_type, &member, member_collection, child));
            }
            Ok(projections)
        }
    }
}

fn project(
    parent_type: EntityType,
    parent: &Record,
    collection: &'static str,
    child: Record,
) -> Projection {
    let mut record = parent.pick(&["uuid"], &[collection]);
    let mut children = ChildCollection::from_vec(record.collection(collection));
    merge_child(&mut children, child);
    record.set_collection(collection, children.into_vec());
    Projection {
        parent_type,
        collection,
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, UpdateMode};
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        Record::from_value(value).expect("object record")
    }

    fn resource(value: Value) -> Resource {
        Resource::from_value(value).expect("object resource")
    }

    fn store_with(entity_type: EntityType, records: &[Value]) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        for r in records {
            store
                .create(entity_type, record(r.clone()), UpdateMode::All)
                .expect("seed");
        }
        store
    }

    #[test]
    fn resolves_parent_by_foreign_key() {
        let store = store_with(EntityType::Concept, &[json!({"uuid": "c1", "name": "Yes"})]);
        let answer = resource(json!({"uuid": "a1", "conceptAnswerUUID": "c1"}));

        let parent = resolve_parent(
            &store,
            EntityType::ConceptAnswer,
            &answer,
            "conceptAnswerUUID",
            EntityType::Concept,
        )
        .expect("resolved");
        assert_eq!(parent.uuid(), Some("c1"));
    }

    #[test]
    fn resolves_role_and_hal_link_encodings() {
        let store = store_with(EntityType::Individual, &[json!({"uuid": "i1"})]);

        for r in [
            json!({"uuid": "e1", "individual": {"uuid": "i1"}}),
            json!({"uuid": "e1", "individualUUID": {"uuid": "i1"}}),
            json!({"uuid": "e1", "_links": {"individualUUID": {"href": "i1"}}}),
        ] {
            let parent = resolve_parent(
                &store,
                EntityType::Encounter,
                &resource(r),
                "individualUUID",
                EntityType::Individual,
            )
            .expect("resolved");
            assert_eq!(parent.uuid(), Some("i1"));
        }
    }

    #[test]
    fn missing_parent_is_association_error() {
        let store = InMemoryStore::new();
        let child = resource(json!({"uuid": "pe1", "individualUUID": "i9"}));

        let err = resolve_parent(
            &store,
            EntityType::ProgramEnrolment,
            &child,
            "individualUUID",
            EntityType::Individual,
        )
        .expect_err("should fail");

        assert_eq!(err.code(), "ProgramEnrolment-Individual-Association");
        assert_eq!(
            err.to_string(),
            "ProgramEnrolment{uuid='pe1'} is unable to find Individual{uuid='i9'}"
        );
    }

    #[test]
    fn absent_foreign_key_is_association_error() {
        let store = InMemoryStore::new();
        let err = resolve_parent(
            &store,
            EntityType::Encounter,
            &resource(json!({"uuid": "e1"})),
            "individualUUID",
            EntityType::Individual,
        )
        .expect_err("should fail");
        assert_eq!(err.parent_uuid, None);
    }

    #[test]
    fn voided_membership_tolerates_missing_member() {
        let store = store_with(EntityType::Individual, &[json!({"uuid": "g1"})]);
        let membership = resource(json!({
            "uuid": "gs1", "groupSubjectUUID": "g1", "memberSubjectUUID": "m9", "voided": true
        }));

        let parents = resolve_group_association(
            &store,
            EntityType::GroupSubject,
            &membership,
            "groupSubjectUUID",
            "memberSubjectUUID",
            EntityType::Individual,
        )
        .expect("voided membership resolves");
        assert_eq!(parents.group.uuid(), Some("g1"));
        assert!(parents.member.is_none());
    }

    #[test]
    fn active_membership_requires_member() {
        let store = store_with(EntityType::Individual, &[json!({"uuid": "g1"})]);
        let membership = resource(json!({
            "uuid": "gs1", "groupSubjectUUID": "g1", "memberSubjectUUID": "m9"
        }));

        let err = resolve_group_association(
            &store,
            EntityType::GroupSubject,
            &membership,
            "groupSubjectUUID",
            "memberSubjectUUID",
            EntityType::Individual,
        )
        .expect_err("should fail");
        assert_eq!(err.parent_uuid.as_deref(), Some("m9"));
    }

    #[test]
    fn validate_checks_only_present_keys() {
        let store = store_with(EntityType::IdentifierSource, &[json!({"uuid": "src1"})]);

        let ok = resource(json!({"uuid": "ia1", "identifierSourceUUID": "src1"}));
        validate_parent_associations(&store, EntityType::IdentifierAssignment, &ok)
            .expect("only the source is named");

        let dangling = resource(json!({
            "uuid": "ia1", "identifierSourceUUID": "src1", "individualUUID": "i9"
        }));
        let err = validate_parent_associations(&store, EntityType::IdentifierAssignment, &dangling)
            .expect_err("should fail");
        assert_eq!(err.code(), "IdentifierAssignment-Individual-Association");
    }

    #[test]
    fn strategies_follow_owned_collections() {
        assert_eq!(
            merge_strategy(EntityType::Concept, EntityType::ConceptAnswer).expect("owned"),
            MergeStrategy::Single {
                foreign_key: "conceptUUID",
                collection: "answers"
            }
        );
        assert!(matches!(
            merge_strategy(EntityType::Individual, EntityType::GroupSubject).expect("owned"),
            MergeStrategy::GroupAffiliation {
                group_collection: "groupSubjects",
                member_collection: "groups",
                ..
            }
        ));
        match merge_strategy(EntityType::Concept, EntityType::Encounter) {
            Err(CoreError::UnsupportedChild { child, parent }) => {
                assert_eq!(child, EntityType::Encounter);
                assert_eq!(parent, EntityType::Concept);
            }
            other => panic!("expected UnsupportedChild, got {other:?}"),
        }
    }

    #[test]
    fn associate_child_projects_parent_with_merged_collection() {
        let mut store = InMemoryStore::new();
        store
            .create(
                EntityType::Concept,
                record(json!({"uuid": "c1", "name": "Colour", "answers": [{"uuid": "a0"}]})),
                UpdateMode::All,
            )
            .expect("seed");
        let child_resource = resource(json!({"uuid": "a1", "conceptUUID": "c1"}));
        let child_record = record(json!({"uuid": "a1", "answerOrder": 1.0}));
        let strategy = merge_strategy(EntityType::Concept, EntityType::ConceptAnswer).expect("owned");

        let projections = associate_child(
            &store,
            EntityType::Concept,
            EntityType::ConceptAnswer,
            strategy,
            &child_record,
            &child_resource,
        )
        .expect("associated");

        assert_eq!(projections.len(), 1);
        let projection = &projections[0];
        assert_eq!(projection.parent_uuid(), "c1");
        assert!(projection.record.get("name").is_none());
        let answers: Vec<_> = projection
            .record
            .collection("answers")
            .iter()
            .filter_map(|r| r.uuid().map(str::to_owned))
            .collect();
        assert_eq!(answers, ["a0", "a1"]);
    }
}
