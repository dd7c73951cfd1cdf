//! Applying sync pages to the store.
//!
//! Each resource in a page is built into its entity, written under its own type, and added to
//! the owning collection(s) of its parent(s). Parent-side additions are collected as projections
//! while the page is applied and folded per parent collection, so one parent write carries every
//! child the page delivered for it. Projections are flushed when the page ends, and also when a
//! resource fails, before the error is returned; resources applied before the failure stay
//! applied.

use crate::association::{associate_child, merge_strategy, Projection};
use crate::config::CoreConfig;
use crate::entities::{
    AddressLevel, Checklist, ChecklistDetail, ChecklistItem, ChecklistItemDetail, Concept,
    ConceptAnswer, Encounter, EncounterType, Form, FormElement, FormElementGroup, FormMapping,
    Gender, GroupSubject, IdentifierAssignment, IdentifierSource, Individual,
    IndividualRelationship, Program, ProgramEnrolment, SubjectType,
};
use crate::lifecycle::{FromResource, SyncContext};
use crate::mapper::{to_record, Entity};
use crate::merge::merge_collections_on_key;
use crate::store::{EntityStore, Record, UpdateMode};
use crate::{CoreError, CoreResult};
use fieldcare_types::EntityType;
use fieldcare_wire::{Resource, ResourcePage};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Outcome of applying one page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub entity_type: Option<EntityType>,
    /// Resources written under their own type.
    pub applied: usize,
    /// Parent collections updated.
    pub parents_updated: usize,
}

/// Applies a page of `entity_type` resources to `store`.
///
/// # Errors
///
/// Returns [`CoreError::NotSyncable`] for locally held types, and the first error raised while
/// building or writing a resource (typically [`CoreError::Association`]).
pub fn apply_page(
    store: &mut dyn EntityStore,
    entity_type: EntityType,
    page: &ResourcePage,
    config: &CoreConfig,
) -> CoreResult<PageSummary> {
    use EntityType as E;
    match entity_type {
        E::Gender => apply_typed::<Gender>(store, page, config),
        E::SubjectType => apply_typed::<SubjectType>(store, page, config),
        E::AddressLevel => apply_typed::<AddressLevel>(store, page, config),
        E::Program => apply_typed::<Program>(store, page, config),
        E::EncounterType => apply_typed::<EncounterType>(store, page, config),
        E::IdentifierSource => apply_typed::<IdentifierSource>(store, page, config),
        E::Concept => apply_typed::<Concept>(store, page, config),
        E::ConceptAnswer => apply_typed::<ConceptAnswer>(store, page, config),
        E::Form => apply_typed::<Form>(store, page, config),
        E::FormElementGroup => apply_typed::<FormElementGroup>(store, page, config),
        E::FormElement => apply_typed::<FormElement>(store, page, config),
        E::FormMapping => apply_typed::<FormMapping>(store, page, config),
        E::ChecklistDetail => apply_typed::<ChecklistDetail>(store, page, config),
        E::ChecklistItemDetail => apply_typed::<ChecklistItemDetail>(store, page, config),
        E::Individual => apply_typed::<Individual>(store, page, config),
        E::ProgramEnrolment => apply_typed::<ProgramEnrolment>(store, page, config),
        E::Encounter => apply_typed::<Encounter>(store, page, config),
        E::IndividualRelationship => apply_typed::<IndividualRelationship>(store, page, config),
        E::GroupSubject => apply_typed::<GroupSubject>(store, page, config),
        E::Checklist => apply_typed::<Checklist>(store, page, config),
        E::ChecklistItem => apply_typed::<ChecklistItem>(store, page, config),
        E::IdentifierAssignment => apply_typed::<IdentifierAssignment>(store, page, config),
        E::DraftSubject | E::EntitySyncStatus => Err(CoreError::NotSyncable(entity_type)),
    }
}

fn apply_typed<T: FromResource + Entity>(
    store: &mut dyn EntityStore,
    page: &ResourcePage,
    config: &CoreConfig,
) -> CoreResult<PageSummary> {
    let mut projections = Vec::new();
    let mut applied = 0;
    let mut outcome = Ok(());
    for resource in page.iter() {
        match apply_resource::<T>(store, page, config, resource) {
            Ok(mut resource_projections) => {
                applied += 1;
                projections.append(&mut resource_projections);
            }
            Err(err) => {
                outcome = Err(err);
                break;
            }
        }
    }

    let parents_updated = flush_projections(store, projections)?;
    outcome?;

    info!(
        entity_type = %T::TYPE,
        applied,
        parents_updated,
        "applied page"
    );
    Ok(PageSummary {
        entity_type: Some(T::TYPE),
        applied,
        parents_updated,
    })
}

fn apply_resource<T: FromResource + Entity>(
    store: &mut dyn EntityStore,
    page: &ResourcePage,
    config: &CoreConfig,
    resource: &Resource,
) -> CoreResult<Vec<Projection>> {
    let entity = {
        let mut ctx = SyncContext::new(&mut *store, page, config);
        T::from_resource(resource, &mut ctx)?
    };
    let record = to_record(&entity)?;

    let mut projections = Vec::new();
    for parent_type in owning_types(T::TYPE) {
        let strategy = merge_strategy(parent_type, T::TYPE)?;
        projections.extend(associate_child(
            &*store,
            parent_type,
            T::TYPE,
            strategy,
            &record,
            resource,
        )?);
    }

    let owned: Vec<&str> = T::TYPE
        .child_associations()
        .iter()
        .map(|assoc| assoc.collection)
        .collect();
    store.create(T::TYPE, record.without_fields(&owned), UpdateMode::Modified)?;
    debug!(entity_type = %T::TYPE, uuid = %entity.uuid(), "applied resource");
    Ok(projections)
}

/// Distinct parent types owning a collection of `child_type`, in declaration order.
fn owning_types(child_type: EntityType) -> Vec<EntityType> {
    let mut parents = Vec::new();
    for (parent_type, _) in child_type.owners() {
        if !parents.contains(&parent_type) {
            parents.push(parent_type);
        }
    }
    parents
}

/// Folds projections per parent collection and writes each parent once.
///
/// The child records are already written under their own type, so the parent collection is
/// written as uuid links.
fn flush_projections(
    store: &mut dyn EntityStore,
    projections: Vec<Projection>,
) -> CoreResult<usize> {
    let mut order = Vec::new();
    let mut grouped: HashMap<(EntityType, String, &'static str), Vec<Record>> = HashMap::new();
    for projection in projections {
        let key = (
            projection.parent_type,
            projection.parent_uuid().to_owned(),
            projection.collection,
        );
        if !grouped.contains_key(&key) {
            order.push(key.clone());
        }
        grouped.entry(key).or_default().push(projection.record);
    }

    let mut written = 0;
    for key in order {
        let Some(records) = grouped.remove(&key) else {
            continue;
        };
        let (parent_type, _, collection) = key;
        let Some(mut record) = merge_collections_on_key(collection)(records) else {
            continue;
        };
        let links: Vec<Value> = record
            .collection(collection)
            .iter()
            .filter_map(Record::uuid)
            .map(|uuid| Value::String(uuid.to_owned()))
            .collect();
        record.set(collection, Value::Array(links));
        store.create(parent_type, record, UpdateMode::Modified)?;
        written += 1;
    }
    Ok(written)
}
