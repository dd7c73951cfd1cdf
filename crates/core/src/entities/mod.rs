//! Domain entities.
//!
//! Each persisted entity is a plain struct whose serde form is its store record (camelCase
//! fields). Owned children live in [`ChildCollection`](crate::collection::ChildCollection)s; owning
//! parents are held as [`EntityRef`](crate::entity_ref::EntityRef)s; small reference data is
//! embedded as a reference copy.

/// Implements [`Entity`](crate::mapper::Entity) for a struct with `uuid` (and optionally
/// `voided`) fields.
macro_rules! impl_entity {
    ($ty:ty, $entity_type:expr, unvoidable) => {
        impl $crate::mapper::Entity for $ty {
            const TYPE: fieldcare_types::EntityType = $entity_type;

            fn uuid(&self) -> &fieldcare_uuid::EntityUuid {
                &self.uuid
            }
        }
    };
    ($ty:ty, $entity_type:expr) => {
        impl $crate::mapper::Entity for $ty {
            const TYPE: fieldcare_types::EntityType = $entity_type;

            fn uuid(&self) -> &fieldcare_uuid::EntityUuid {
                &self.uuid
            }

            fn voided(&self) -> bool {
                self.voided
            }
        }
    };
}

mod checklist;
mod concept;
mod draft;
mod encounter;
mod enrolment;
mod form;
mod identifier;
mod individual;
mod reference;
mod relationship;

pub use checklist::{Checklist, ChecklistDetail, ChecklistItem, ChecklistItemDetail, ChecklistItemStatus};
pub use concept::{Concept, ConceptAnswer, KeyValue};
pub use draft::{DraftSubject, EntitySyncStatus};
pub use encounter::Encounter;
pub use enrolment::ProgramEnrolment;
pub use form::{Form, FormElement, FormElementGroup, FormMapping, FormType};
pub use identifier::IdentifierAssignment;
pub use individual::Individual;
pub use reference::{AddressLevel, EncounterType, Gender, IdentifierSource, Program, SubjectType, SubjectTypeKind};
pub use relationship::{GroupSubject, IndividualRelationship};

use fieldcare_uuid::EntityUuid;
use fieldcare_wire::Resource;

/// A resource carrying the fields every entity sends.
pub(crate) fn base_resource(uuid: &EntityUuid, voided: bool) -> Resource {
    let mut resource = Resource::new();
    resource.insert("uuid", uuid.as_str()).insert("voided", voided);
    resource
}
